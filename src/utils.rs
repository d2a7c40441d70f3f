use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use url::Url;

use crate::types::{Header, ProtocolError, Target};

pub const USER_AGENT: &str = "hijackhttp/0.1.0";
pub const CRLF: &str = "\r\n";
pub const HTTP_VERSION_1_1: &str = "HTTP/1.1";
pub const HOST_HEADER: &str = "host";
pub const CONTENT_LENGTH_HEADER: &str = "content-length";
pub const TRANSFER_ENCODING_HEADER: &str = "transfer-encoding";
pub const USER_AGENT_HEADER: &str = "user-agent";
pub const UPGRADE_HEADER: &str = "upgrade";
pub const CONNECTION_HEADER: &str = "connection";
pub const CHUNKED_ENCODING: &str = "chunked";

pub fn ensure_user_agent(headers: &mut Vec<Header>) {
    if !headers.iter().any(|h| h.is(USER_AGENT_HEADER)) {
        headers.push(Header::new(USER_AGENT_HEADER, USER_AGENT));
    }
}

pub fn parse_target(target: &str) -> Result<Target, ProtocolError> {
    let url = Url::parse(target)
        .map_err(|e| ProtocolError::InvalidTarget(format!("{} ({})", target, e)))?;

    if url.host_str().is_none() {
        return Err(ProtocolError::InvalidTarget(format!(
            "Target '{}' is missing a host",
            target
        )));
    }

    if url.port_or_known_default().is_none() {
        return Err(ProtocolError::InvalidTarget(format!(
            "Target '{}' has no known port",
            target
        )));
    }

    Ok(Target::new(url))
}

/// Parse one header line. A line without a colon becomes a valueless header
/// rather than an error, matching what shows up on the wire.
pub fn parse_header(line: &str) -> Option<Header> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(':') {
        Some((name, value)) => Some(Header::new(name, value.trim_start())),
        None => Some(Header::new_valueless(line)),
    }
}

pub fn header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.is(name))
        .and_then(|h| h.value.as_deref())
}

/// Parse an HTTP/1.x status line into (status code, protocol version).
pub fn parse_status_line(line: &str) -> Result<(u16, String), ProtocolError> {
    let mut parts = line.trim_end().splitn(3, ' ');

    let protocol = parts
        .next()
        .filter(|p| p.starts_with("HTTP/"))
        .ok_or_else(|| {
            ProtocolError::InvalidResponse(format!("Malformed status line '{}'", line.trim_end()))
        })?;

    let status = parts
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| {
            ProtocolError::InvalidResponse(format!(
                "Status line '{}' has no status code",
                line.trim_end()
            ))
        })?;

    Ok((status, protocol.to_string()))
}

pub async fn timeout_result<F, T>(duration: Option<Duration>, future: F) -> Result<T, ProtocolError>
where
    F: Future<Output = Result<T, ProtocolError>>,
{
    if let Some(duration) = duration {
        match timeout(duration, future).await {
            Ok(result) => result,
            Err(_) => Err(ProtocolError::Timeout),
        }
    } else {
        future.await
    }
}
