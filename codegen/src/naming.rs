use check_keyword::CheckKeyword;
use heck::{ToPascalCase, ToSnakeCase};
use wsdl2rs_wsdl::types::trim_ns;

/// Columns a doc comment line may take before wrapping.
const DOC_WIDTH: usize = 60;

/// Names the generated module uses itself, either from the prelude, from
/// its imports, or as local items inside client functions.
const RESERVED_TYPES: &[&str] = &[
    "AnyValue",
    "Box",
    "Clone",
    "Date",
    "DateTime",
    "Debug",
    "Default",
    "Deserialize",
    "Duration",
    "Err",
    "None",
    "Ok",
    "Option",
    "PartialEq",
    "Request",
    "Response",
    "ResponseBody",
    "ResponseEnvelope",
    "Result",
    "Self",
    "Serialize",
    "Some",
    "String",
    "Time",
    "Vec",
];

/// Rust type name for a schema name: namespace prefix dropped, words
/// capitalised, names the module already uses suffixed with `Type`.
pub fn type_name(name: &str) -> String {
    let mut symbol = trim_ns(name).to_pascal_case();

    if symbol.is_empty() {
        symbol.push_str("Unnamed");
    }

    if symbol.starts_with(|c: char| c.is_ascii_digit()) {
        symbol.insert(0, '_');
    }

    if RESERVED_TYPES.contains(&symbol.as_str()) {
        symbol.push_str("Type");
    }

    symbol
}

/// Rust field, parameter or function name for a schema name.
pub fn snake_name(name: &str) -> String {
    let mut symbol = trim_ns(name).to_snake_case();

    if symbol.is_empty() {
        symbol.push_str("value");
    }

    if symbol.starts_with(|c: char| c.is_ascii_digit()) {
        symbol.insert(0, '_');
    }

    if symbol.is_keyword() {
        symbol.push('_');
    }

    symbol
}

/// Wraps a documentation string into doc comment lines. Missing or blank
/// documentation gets a generated sentence naming `symbol`.
pub fn doc_lines(symbol: &str, documentation: Option<&str>) -> Vec<String> {
    let documentation = documentation
        .map(|text| text.replace('\n', " ").trim().to_owned())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| format!("{} was auto-generated from WSDL.", symbol));

    let mut lines = Vec::new();
    let mut line = String::new();

    for word in documentation.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > DOC_WIDTH {
            lines.push(std::mem::take(&mut line));
        }

        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines
}
