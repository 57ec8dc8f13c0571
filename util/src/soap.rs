use log::debug;
use reqwest::{blocking::Client as Reqwest, header};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::error::Error;

pub const SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Soap11,
    Soap12,
}

impl Version {
    fn namespace(self) -> &'static str {
        match self {
            Version::Soap11 => SOAP11_NAMESPACE,
            Version::Soap12 => SOAP12_NAMESPACE,
        }
    }

    fn content_type(self, action: Option<&str>) -> String {
        match (self, action) {
            (Version::Soap11, _) => "text/xml; charset=utf-8".to_owned(),
            (Version::Soap12, Some(action)) => {
                format!("application/soap+xml; charset=utf-8; action=\"{}\"", action)
            }
            (Version::Soap12, None) => "application/soap+xml; charset=utf-8".to_owned(),
        }
    }
}

#[derive(Serialize)]
struct RequestEnvelope<'a, T> {
    #[serde(rename = "@xmlns:soapenv")]
    namespace: &'static str,

    #[serde(rename = "soapenv:Body")]
    body: &'a T,
}

/// A reply envelope, matched by local names so any envelope prefix works.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "Body")]
    pub body: T,
}

/// Wraps `body` in a SOAP envelope of the given version.
pub fn to_request<T: Serialize>(version: Version, body: &T) -> Result<String, Error> {
    let envelope = RequestEnvelope {
        namespace: version.namespace(),
        body,
    };

    quick_xml::se::to_string_with_root("soapenv:Envelope", &envelope).map_err(Error::Serialize)
}

pub fn from_response<R: DeserializeOwned>(reply: &str) -> Result<Envelope<R>, Error> {
    quick_xml::de::from_str(reply).map_err(Error::Deserialize)
}

/// The transport handed to generated clients.
pub struct Client {
    http: Reqwest,
    url: String,
    party: Option<String>,
}

impl Client {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            http: Reqwest::new(),
            url: url.into(),
            party: None,
        }
    }

    pub fn with_http(mut self, http: Reqwest) -> Self {
        self.http = http;
        self
    }

    /// Sets the party identifier injected into SOAP 1.1 requests whose
    /// payload carries a `party` field.
    pub fn with_party<S: Into<String>>(mut self, party: S) -> Self {
        self.party = Some(party.into());
        self
    }

    pub fn party(&self) -> Option<String> {
        self.party.clone()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn post(&self, version: Version, action: Option<&str>, body: String) -> Result<String, Error> {
        let mut request = self
            .http
            .post(&self.url)
            .header(header::CONTENT_TYPE, version.content_type(action))
            .body(body);

        if version == Version::Soap11 {
            request = request.header("SOAPAction", format!("\"{}\"", action.unwrap_or_default()));
        }

        let to_error = |source| Error::Http {
            url: self.url.clone(),
            source,
        };

        let response = request
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(to_error)?;

        response.text().map_err(to_error)
    }

    /// Sends `request` as the body of a SOAP 1.2 envelope and returns the
    /// reply body.
    pub fn round_trip_soap12<T: Serialize, R: DeserializeOwned>(
        &self,
        action: &str,
        request: &T,
    ) -> Result<R, Error> {
        debug!("Calling {} at {} over SOAP 1.2", action, self.url);

        let body = to_request(Version::Soap12, request)?;
        let reply = self.post(Version::Soap12, Some(action), body)?;
        Ok(from_response::<R>(&reply)?.body)
    }

    /// Sends `request` as the body of a SOAP 1.1 envelope with a
    /// `SOAPAction` header and returns the whole reply envelope.
    pub fn call<T: Serialize, R: DeserializeOwned>(
        &self,
        action: &str,
        request: &T,
    ) -> Result<R, Error> {
        debug!("Calling {} at {} over SOAP 1.1", action, self.url);

        let body = to_request(Version::Soap11, request)?;
        let reply = self.post(Version::Soap11, Some(action), body)?;
        quick_xml::de::from_str(&reply).map_err(Error::Deserialize)
    }

    /// Sends `request` in a SOAP 1.1 envelope without a soap action and
    /// returns the reply body.
    pub fn round_trip<T: Serialize, R: DeserializeOwned>(
        &self,
        operation: &str,
        request: &T,
    ) -> Result<R, Error> {
        debug!("Calling {} at {}", operation, self.url);

        let body = to_request(Version::Soap11, request)?;
        let reply = self.post(Version::Soap11, None, body)?;
        Ok(from_response::<R>(&reply)?.body)
    }
}
