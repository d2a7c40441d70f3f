use bytes::Bytes;

use super::error::ProtocolError;
use super::header::Header;
use super::target::Target;
use super::timeouts::ClientTimeouts;
use crate::utils::parse_target;

/// A fully formed request descriptor: method, target, headers, optional body.
///
/// The target's scheme decides how the connection is dialed (`http` plain,
/// `https` with a TLS handshake). Per-request timeouts, when set, override the
/// client's defaults for this call only.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub target: Target,
    pub headers: Vec<Header>,
    pub body: Option<Bytes>,
    pub timeouts: Option<ClientTimeouts>,
}

impl Request {
    pub fn new(target: &str, method: impl Into<String>) -> Result<Self, ProtocolError> {
        Ok(Self {
            method: method.into(),
            target: parse_target(target)?,
            headers: Vec::new(),
            body: None,
            timeouts: None,
        })
    }

    pub fn get(target: &str) -> Result<Self, ProtocolError> {
        Self::new(target, "GET")
    }

    pub fn post(target: &str) -> Result<Self, ProtocolError> {
        Self::new(target, "POST")
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeouts(mut self, timeouts: ClientTimeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Timeouts for this call: the request's own if set, otherwise the
    /// client's defaults.
    pub fn effective_timeouts(&self, defaults: &ClientTimeouts) -> ClientTimeouts {
        self.timeouts.clone().unwrap_or_else(|| defaults.clone())
    }
}
