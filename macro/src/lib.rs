//! `wsdl2rs!("service.wsdl")` expands to the client module generated from
//! the description. Relative paths start at the calling crate's manifest.

extern crate proc_macro;

use proc_macro::TokenStream;
use std::{env, path::Path};
use syn::{parse_macro_input, LitStr};
use wsdl2rs_codegen::{self as codegen, Options};
use wsdl2rs_wsdl::{FetchOptions, HttpFetcher};

fn location(value: String) -> String {
    match env::var("CARGO_MANIFEST_DIR") {
        Ok(root) if !value.contains("://") && Path::new(&value).is_relative() => {
            Path::new(&root).join(value).display().to_string()
        }
        _ => value,
    }
}

fn expand(location: &str) -> Result<TokenStream, String> {
    let fetcher = HttpFetcher::new(&FetchOptions::default()).map_err(|error| error.to_string())?;
    let code = codegen::from_url(location, &fetcher, &Options::new()).map_err(|error| error.to_string())?;

    code.parse()
        .map_err(|error: proc_macro::LexError| error.to_string())
}

#[proc_macro]
pub fn wsdl2rs(input: TokenStream) -> TokenStream {
    let literal = parse_macro_input!(input as LitStr);
    let location = location(literal.value());

    match expand(&location) {
        Ok(tokens) => tokens,
        Err(message) => syn::Error::new(literal.span(), format!("{}: {}", location, message))
            .to_compile_error()
            .into(),
    }
}
