//! Runtime support for code generated by `wsdl2rs`.

pub mod error;
pub mod soap;
pub mod xml;

pub use error::Error;
pub use soap::Client;
