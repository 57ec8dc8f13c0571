use log::{debug, trace};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::{
    io::Write,
    process::{Command, Stdio},
};

use super::{
    client::{client_sections, ClientSections},
    codegen::{date_aliases, types_section},
    error::Error,
    naming::snake_name,
    options::{FormatterKind, Mode},
    types::Context,
};

/// Module name: the override, else the binding, else the port type.
pub fn package_name(context: &Context) -> String {
    let registry = context.registry;

    let name = context
        .options
        .package
        .clone()
        .or_else(|| registry.binding.as_ref().map(|binding| binding.name.clone()))
        .or_else(|| registry.port_type.clone())
        .unwrap_or_else(|| "service".to_owned());

    snake_name(&name)
}

fn constants(context: &Context) -> TokenStream {
    let namespace = &context.registry.target_namespace;

    let version = context.options.request_version.as_ref().map(|version| {
        quote! {
            #[doc = " Version sent with every request."]
            pub const REQUEST_VERSION: &str = #version;
        }
    });

    quote! {
        #[doc = " Target namespace of the service schema."]
        pub const NAMESPACE: &str = #namespace;

        #version
    }
}

/// Orders the module body the way the mode asks for.
fn body(context: &Context, mode: Mode) -> Result<Vec<TokenStream>, Error> {
    let types = match mode {
        Mode::InterfaceOnly => Vec::new(),
        Mode::All | Mode::TypesOnly => types_section(context)?,
    };

    let ClientSections {
        interface,
        client_type,
        client_funcs,
    } = match mode {
        Mode::TypesOnly => ClientSections::default(),
        Mode::All | Mode::InterfaceOnly => client_sections(context)?,
    };

    let bound = context.registry.has_binding_operations();
    trace!("Assembling {:?} output, bound operations: {}", mode, bound);

    let sections = match (bound, mode) {
        (_, Mode::TypesOnly) => vec![types],
        (true, Mode::InterfaceOnly) => vec![interface, client_type, client_funcs],
        (true, Mode::All) => vec![interface, types, client_type, client_funcs],
        (false, Mode::InterfaceOnly) => vec![client_funcs],
        (false, Mode::All) => vec![client_funcs, types],
    };

    Ok(sections.into_iter().flatten().collect())
}

/// Renders the whole module as unformatted source text, one item per line.
pub fn render(context: &Context) -> Result<String, Error> {
    let mode = context.options.mode();
    let items = body(context, mode)?;

    let package = format_ident!("{}", package_name(context));

    let (imports, prelude) = match mode {
        Mode::InterfaceOnly => (quote!(use super::super::types::#package::*;), Vec::new()),
        Mode::All | Mode::TypesOnly => {
            let mut prelude = vec![constants(context)];
            prelude.extend(date_aliases(context));
            (quote!(), prelude)
        }
    };

    let header = quote! {
        #![allow(
            dead_code,
            non_camel_case_types,
            non_snake_case,
            unused_imports,
            unused_variables,
            clippy::all
        )]

        use serde::{Deserialize, Serialize};
        use wsdl2rs_util as runtime;
        #imports
    };

    let lines = std::iter::once(header)
        .chain(prelude)
        .chain(items)
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    Ok(format!("pub mod {} {{\n{}\n}}\n", package, lines.join("\n")))
}

fn numbered(code: &str) -> String {
    code.lines()
        .enumerate()
        .map(|(index, line)| format!("{:5}\t{}\n", index + 1, line))
        .collect()
}

fn rustfmt(program: &str, code: &str) -> Result<String, Error> {
    let failure = |diagnostic: String| Error::Formatter {
        formatter: program.to_owned(),
        diagnostic,
        code: code.to_owned(),
    };

    let mut child = Command::new(program)
        .args(["--edition", "2021"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| failure(error.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(code.as_bytes())
            .map_err(|error| failure(error.to_string()))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|error| failure(error.to_string()))?;

    if !output.status.success() {
        return Err(failure(format!(
            "{}\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    String::from_utf8(output.stdout).map_err(|error| failure(error.to_string()))
}

/// Checks that `code` parses as a Rust file, then pretty-prints it.
pub fn format(code: &str, formatter: &FormatterKind) -> Result<String, Error> {
    let file = syn::parse_file(code).map_err(|error| Error::GeneratedSyntax {
        diagnostic: error.to_string(),
        listing: numbered(code),
    })?;

    match formatter {
        FormatterKind::PrettyPlease => Ok(prettyplease::unparse(&file)),
        FormatterKind::Rustfmt { program } => {
            debug!("Formatting with {}", program);
            rustfmt(program, code)
        }
    }
}

pub fn assemble(context: &Context) -> Result<String, Error> {
    let code = render(context)?;
    format(&code, &context.options.formatter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_code_is_listed() {
        let error = format("pub mod broken {\nfn (\n}\n", &FormatterKind::PrettyPlease).unwrap_err();

        match error {
            Error::GeneratedSyntax { listing, .. } => {
                assert_eq!(listing, "    1\tpub mod broken {\n    2\tfn (\n    3\t}\n");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn missing_rustfmt_is_a_formatter_error() {
        let formatter = FormatterKind::Rustfmt {
            program: "wsdl2rs-no-such-formatter".to_owned(),
        };

        match format("pub mod fine {}", &formatter).unwrap_err() {
            Error::Formatter { formatter, code, .. } => {
                assert_eq!(formatter, "wsdl2rs-no-such-formatter");
                assert_eq!(code, "pub mod fine {}");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn prettyplease_formats() {
        let formatted = format("pub mod m { pub struct A { pub b : i32 , } }", &FormatterKind::PrettyPlease).unwrap();
        assert_eq!(formatted, "pub mod m {\n    pub struct A {\n        pub b: i32,\n    }\n}\n");
    }
}
