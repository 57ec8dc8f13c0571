use thiserror::Error;
use wsdl2rs_wsdl::error::Error as WsdlError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to load service description")]
    Fetch(#[from] WsdlError),

    #[error("Operation {operation:?} wants message {message:?} but it's not defined")]
    UndefinedMessage { operation: String, message: String },

    #[error("Binding {binding:?} requires port type {port_type:?} but it's not defined")]
    BindingMismatch { binding: String, port_type: String },

    #[error("Generated bad code: {diagnostic}\n{listing}")]
    GeneratedSyntax { diagnostic: String, listing: String },

    #[error("{formatter} failed: {diagnostic}\ngenerated code:\n{code}")]
    Formatter {
        formatter: String,
        diagnostic: String,
        code: String,
    },
}
