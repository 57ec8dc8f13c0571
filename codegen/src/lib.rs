use log::debug;
use url::Url;
use wsdl2rs_wsdl::{self as wsdl, types::Definitions, Fetch};

mod assembler;
mod client;
mod codegen;
mod flatten;
mod naming;
mod registry;
mod resolver;
mod types;

pub mod error;
pub mod options;

pub use error::Error;
pub use options::{FormatterKind, Mode, Options};

/// Generates the client module for parsed `definitions`. Imports are
/// resolved against `base` through `fetcher`.
pub fn generate(
    definitions: Definitions,
    base: &Url,
    fetcher: &dyn Fetch,
    options: &Options,
) -> Result<String, Error> {
    let resolved = resolver::resolve(definitions, base, fetcher)?;

    let mut registry = registry::Registry::build(resolved, options);
    flatten::flatten(&mut registry);
    debug!("Flattened {} complex types", registry.complex_types.len());

    let context = types::Context::new(&registry, options);
    assembler::assemble(&context)
}

/// Fetches, parses and generates from a path or URL.
pub fn from_url<S: AsRef<str>>(
    location: S,
    fetcher: &dyn Fetch,
    options: &Options,
) -> Result<String, Error> {
    let (definitions, base) = wsdl::parse(location, fetcher)?;
    generate(definitions, &base, fetcher, options)
}
