use std::collections::BTreeMap;

/// Prefix → namespace URI declarations.
pub type Namespaces = BTreeMap<String, String>;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub namespace: Option<String>,
    pub location: String,
}

#[derive(Default, Debug, Clone)]
pub struct Definitions {
    pub name: Option<String>,
    pub target_namespace: String,
    pub namespaces: Namespaces,
    pub imports: Vec<Import>,
    pub schemas: Vec<Schema>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
}

#[derive(Default, Debug, Clone)]
pub struct Schema {
    pub target_namespace: String,
    pub namespaces: Namespaces,
    pub imports: Vec<Import>,
    pub includes: Vec<Import>,
    pub simple_types: Vec<SimpleType>,
    pub complex_types: Vec<ComplexType>,
    pub elements: Vec<Element>,
}

#[derive(Default, Debug, Clone)]
pub struct SimpleType {
    pub name: String,
    pub target_namespace: String,
    pub documentation: Option<String>,
    pub derivation: Option<SimpleDerivation>,
}

#[derive(Debug, Clone)]
pub enum SimpleDerivation {
    Restriction(Restriction),
    Union(Union),
}

#[derive(Default, Debug, Clone)]
pub struct Restriction {
    pub base: String,
    pub enumerations: Vec<String>,
}

#[derive(Default, Debug, Clone)]
pub struct Union {
    pub member_types: Vec<String>,
    pub simple_types: Vec<SimpleType>,
}

#[derive(Default, Debug, Clone)]
pub struct ComplexType {
    pub name: String,
    pub target_namespace: String,
    pub is_abstract: bool,
    pub documentation: Option<String>,
    pub attributes: Vec<Attribute>,
    /// Elements of an `xs:all` group, and the flat field list once the
    /// type has been flattened.
    pub all_elements: Vec<Element>,
    pub content: Option<Content>,
}

#[derive(Debug, Clone)]
pub enum Content {
    Sequence(Sequence),
    Choice(Choice),
    ComplexContent(ComplexContent),
    SimpleContent(SimpleContent),
}

#[derive(Default, Debug, Clone)]
pub struct Sequence {
    pub elements: Vec<Element>,
    pub complex_types: Vec<ComplexType>,
    pub choices: Vec<Choice>,
    pub any: Vec<Any>,
}

#[derive(Default, Debug, Clone)]
pub struct Choice {
    pub elements: Vec<Element>,
    pub complex_types: Vec<ComplexType>,
    pub any: Vec<Any>,
    pub sequence: Option<Box<Sequence>>,
}

#[derive(Default, Debug, Clone)]
pub struct ComplexContent {
    pub extension: Option<Extension>,
    pub restriction: Option<ComplexRestriction>,
}

#[derive(Default, Debug, Clone)]
pub struct SimpleContent {
    pub extension: Option<Extension>,
}

#[derive(Default, Debug, Clone)]
pub struct Extension {
    pub base: String,
    pub sequence: Option<Sequence>,
    pub choice: Option<Choice>,
    pub attributes: Vec<Attribute>,
}

#[derive(Default, Debug, Clone)]
pub struct ComplexRestriction {
    pub base: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub type_name: String,
    pub ref_name: String,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub nillable: bool,
    pub complex_type: Option<Box<ComplexType>>,
    /// Serialization tag override, used for character data fields.
    pub tag: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub ref_name: String,
    pub type_name: String,
    pub tag_name: Option<String>,
    pub required: bool,
    pub array_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Any {
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
}

#[derive(Default, Debug, Clone)]
pub struct Message {
    pub name: String,
    pub parts: Vec<Part>,
}

#[derive(Default, Debug, Clone)]
pub struct Part {
    pub name: String,
    pub type_name: Option<String>,
    pub element: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct PortType {
    pub name: String,
    pub operations: Vec<Operation>,
}

#[derive(Default, Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    /// `soapAction` of a SOAP 1.2 `operation` binding.
    pub soap12_action: Option<String>,
    /// `soapAction` of a SOAP 1.1 `operation` binding.
    pub soap11_action: Option<String>,
    pub style: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub port_type: String,
    pub style: Option<String>,
    pub transport: Option<String>,
    pub operations: Vec<BindingOperation>,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl MaxOccurs {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "unbounded" => MaxOccurs::Unbounded,
            other => MaxOccurs::Bounded(other.parse().unwrap_or(1)),
        }
    }

    pub fn is_repeated(self) -> bool {
        self != MaxOccurs::Bounded(1)
    }
}

impl Default for Element {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_name: String::new(),
            ref_name: String::new(),
            min_occurs: 1,
            max_occurs: MaxOccurs::Bounded(1),
            nillable: false,
            complex_type: None,
            tag: None,
        }
    }
}

impl Default for Any {
    fn default() -> Self {
        Self {
            min_occurs: 1,
            max_occurs: MaxOccurs::Bounded(1),
        }
    }
}

impl Element {
    /// Copies a referenced element, letting the referencing occurrence
    /// override its name and cardinality.
    pub fn enriched_by(&self, occurrence: &Element) -> Element {
        let mut element = self.clone();
        if !occurrence.name.is_empty() {
            element.name = occurrence.name.clone();
        }
        element.min_occurs = occurrence.min_occurs;
        element.max_occurs = occurrence.max_occurs;
        element.nillable |= occurrence.nillable;
        element
    }
}

impl Sequence {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
            && self.complex_types.is_empty()
            && self.choices.is_empty()
            && self.any.is_empty()
    }
}

impl Choice {
    /// A choice's alternatives laid out as a sequence.
    pub fn as_sequence(&self) -> Sequence {
        Sequence {
            elements: self.elements.clone(),
            complex_types: self.complex_types.clone(),
            choices: Vec::new(),
            any: self.any.clone(),
        }
    }
}

impl Definitions {
    pub fn merge(&mut self, other: Definitions) {
        self.namespaces.extend(other.namespaces);
        self.schemas.extend(other.schemas);
        self.messages.extend(other.messages);
        self.port_types.extend(other.port_types);
        self.bindings.extend(other.bindings);
    }
}

impl Schema {
    /// Appends a fragment's declarations, stamping its types with the
    /// fragment's target namespace. The fragment wins on duplicate prefixes.
    pub fn merge(&mut self, fragment: Schema) {
        let namespace = fragment.target_namespace;
        self.namespaces.extend(fragment.namespaces);

        self.complex_types
            .extend(fragment.complex_types.into_iter().map(|mut ty| {
                ty.target_namespace = namespace.clone();
                ty
            }));
        self.simple_types
            .extend(fragment.simple_types.into_iter().map(|mut ty| {
                ty.target_namespace = namespace.clone();
                ty
            }));
        self.elements
            .extend(fragment.elements.into_iter().map(|mut element| {
                if let Some(ty) = element.complex_type.as_mut() {
                    if ty.target_namespace.is_empty() {
                        ty.target_namespace = namespace.clone();
                    }
                }
                element
            }));
    }
}

/// Strips a namespace prefix from a qualified name.
pub fn trim_ns(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Returns the namespace prefix of a qualified name, if any.
pub fn ns_prefix(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}
