use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path {0:?}")]
    PathConversionError(String, #[source] Option<std::io::Error>),

    #[error("Unable to open file {path}")]
    FileOpenError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to get {url} from server")]
    ReqwestError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unable to configure HTTP client")]
    ClientError(#[source] reqwest::Error),

    #[error("Unable to read client certificate {path}")]
    CertificateError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Both a client certificate and a key are required, only the {0} was given")]
    IncompleteIdentity(&'static str),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Unable to decode document from {0}")]
    DecodeError(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Error parsing XML attribute")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML input is not valid UTF-8")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("<{element}> is missing the required attribute {attribute:?}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Document root must be <definitions> or <schema>, found <{0}>")]
    UnexpectedRoot(String),

    #[error("Unexpected end of <{0}>")]
    UnexpectedEnd(String),
}
