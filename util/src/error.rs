use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unable to serialize request envelope")]
    Serialize(#[source] quick_xml::DeError),

    #[error("Unable to deserialize response envelope")]
    Deserialize(#[source] quick_xml::DeError),

    #[error("Operation {0} has no binding")]
    NotImplemented(&'static str),
}
