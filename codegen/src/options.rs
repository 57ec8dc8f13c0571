/// Which sections of the module to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    TypesOnly,
    InterfaceOnly,
}

/// How the generated source is pretty-printed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormatterKind {
    #[default]
    PrettyPlease,
    Rustfmt {
        program: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Module name, derived from the binding when unset.
    pub package: Option<String>,
    /// Prefix for operation elements in request tags.
    pub namespace: Option<String>,
    /// Service trait name, the port type name when unset.
    pub client_type: Option<String>,
    /// Keep optional fields of non-boxed types as plain values.
    pub no_simple_type_indirect: bool,
    pub request_version: Option<String>,
    pub types_only: bool,
    pub interface_only: bool,
    pub formatter: FormatterKind,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package<S: Into<String>>(mut self, package: S) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn client_type<S: Into<String>>(mut self, client_type: S) -> Self {
        self.client_type = Some(client_type.into());
        self
    }

    pub fn no_simple_type_indirect(mut self) -> Self {
        self.no_simple_type_indirect = true;
        self
    }

    pub fn request_version<S: Into<String>>(mut self, version: S) -> Self {
        self.request_version = Some(version.into());
        self
    }

    pub fn only_types(mut self) -> Self {
        self.types_only = true;
        self
    }

    pub fn only_interface(mut self) -> Self {
        self.interface_only = true;
        self
    }

    pub fn formatter(mut self, formatter: FormatterKind) -> Self {
        self.formatter = formatter;
        self
    }

    /// Types only wins over interface only.
    pub fn mode(&self) -> Mode {
        if self.types_only {
            Mode::TypesOnly
        } else if self.interface_only {
            Mode::InterfaceOnly
        } else {
            Mode::All
        }
    }
}
