use encoding_rs::{Encoding, UTF_8};
use log::debug;
use reqwest::blocking::Client;
use std::{collections::HashMap, path::PathBuf};
use url::Url;

use super::error::Error;

/// Retrieves the raw bytes of a document.
pub trait Fetch {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, Error>;
}

/// Transport configuration for [`HttpFetcher`].
#[derive(Default, Debug, Clone)]
pub struct FetchOptions {
    /// Accept any server certificate.
    pub insecure: bool,
    /// PEM client certificate for mutual TLS.
    pub client_cert: Option<PathBuf>,
    /// PKCS#8 PEM private key matching `client_cert`.
    pub client_key: Option<PathBuf>,
}

/// Fetches `file:` URLs from disk and `http(s):` URLs with a blocking
/// reqwest client.
pub struct HttpFetcher {
    client: Client,
    credentials: HashMap<String, (String, Option<String>)>,
}

fn read_pem(path: &PathBuf) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|source| Error::CertificateError {
        path: path.display().to_string(),
        source,
    })
}

impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self, Error> {
        let mut builder = Client::builder().danger_accept_invalid_certs(options.insecure);

        match (&options.client_cert, &options.client_key) {
            (Some(cert), Some(key)) => {
                let identity = reqwest::Identity::from_pkcs8_pem(&read_pem(cert)?, &read_pem(key)?)
                    .map_err(Error::ClientError)?;
                builder = builder.identity(identity);
            }

            (Some(_), None) => return Err(Error::IncompleteIdentity("certificate")),
            (None, Some(_)) => return Err(Error::IncompleteIdentity("key")),
            (None, None) => (),
        }

        Ok(Self {
            client: builder.build().map_err(Error::ClientError)?,
            credentials: HashMap::new(),
        })
    }

    /// Reuses the user info of `location` as basic auth credentials for
    /// every later request to the same host.
    pub fn with_credentials_from(mut self, location: &Url) -> Self {
        if let (Some(host), false) = (location.host_str(), location.username().is_empty()) {
            self.credentials.insert(
                host.to_owned(),
                (
                    location.username().to_owned(),
                    location.password().map(ToOwned::to_owned),
                ),
            );
        }

        self
    }

    fn fetch_http(&self, location: &Url) -> Result<Vec<u8>, Error> {
        let mut request = self.client.get(location.clone());

        if !location.username().is_empty() {
            request = request.basic_auth(location.username(), location.password());
        } else if let Some((username, password)) = location
            .host_str()
            .and_then(|host| self.credentials.get(host))
        {
            request = request.basic_auth(username, password.as_ref());
        }

        let to_error = |source| Error::ReqwestError {
            url: location.to_string(),
            source,
        };

        let response = request
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(to_error)?;

        Ok(response.bytes().map_err(to_error)?.to_vec())
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, Error> {
        debug!("Fetching {}", location);

        match location.scheme() {
            "file" => {
                let path = location
                    .to_file_path()
                    .map_err(|()| Error::PathConversionError(location.to_string(), None))?;

                std::fs::read(&path).map_err(|source| Error::FileOpenError {
                    path: path.display().to_string(),
                    source,
                })
            }

            "http" | "https" => self.fetch_http(location),

            other => Err(Error::UnsupportedScheme(other.to_owned())),
        }
    }
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(256)];
    let head = String::from_utf8_lossy(head);

    let declaration = head.strip_prefix("<?xml")?;
    let declaration = &declaration[..declaration.find("?>")?];
    let value = declaration.split_once("encoding")?.1.trim_start();
    let value = value.strip_prefix('=')?.trim_start();

    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let label = value[1..].split(quote).next()?;

    Encoding::for_label(label.trim().as_bytes())
}

/// Decodes a fetched document to UTF-8 text, honouring a byte order mark
/// or the charset named in the XML declaration.
pub fn decode(bytes: &[u8], location: &str) -> Result<String, Error> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| declared_encoding(bytes))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(Error::DecodeError(location.to_owned()));
    }

    debug!("Decoded {} as {}", location, used.name());
    Ok(text.into_owned())
}
