use std::path::Path;
use url::Url;

mod parser;

pub mod error;
pub mod fetch;
pub mod types;

pub use fetch::{decode, Fetch, FetchOptions, HttpFetcher};
pub use parser::parse_str;

/// Turns a URL or a filesystem path into an absolute URL.
pub fn location_url<S: AsRef<str>>(location: S) -> Result<Url, error::Error> {
    let location = location.as_ref();

    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(location).canonicalize().map_err(|err| {
                error::Error::PathConversionError(location.to_owned(), Some(err))
            })?;

            Url::from_file_path(&path)
                .map_err(|()| error::Error::PathConversionError(location.to_owned(), None))
        }
        Err(err) => Err(err.into()),
    }
}

/// Fetches, decodes and parses the document at `location`.
pub fn parse<S: AsRef<str>>(
    location: S,
    fetcher: &dyn Fetch,
) -> Result<(types::Definitions, Url), error::Error> {
    let url = location_url(location)?;
    let definitions = parse_url(&url, fetcher)?;
    Ok((definitions, url))
}

pub fn parse_url(url: &Url, fetcher: &dyn Fetch) -> Result<types::Definitions, error::Error> {
    let bytes = fetcher.fetch(url)?;
    parse_bytes(&bytes, url.as_str())
}

pub fn parse_bytes(bytes: &[u8], location: &str) -> Result<types::Definitions, error::Error> {
    let text = decode(bytes, location)?;
    parse_str(&text)
}
