use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::stream::TransportStream;
use crate::tls::{server_name_from_str, TlsPolicy};
use crate::types::ProtocolError;
use crate::utils::timeout_result;

/// Dial capability: opens exactly one connection per call.
///
/// Two strategies implement this, selected by the request scheme. Neither
/// caches, pools, or reuses anything; every call is a fresh dial and the
/// returned stream is owned entirely by the caller.
#[async_trait]
pub trait Dial: Send + Sync {
    async fn dial(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
    ) -> Result<TransportStream, ProtocolError>;
}

/// Plain TCP dial for `http` targets.
pub struct PlainDialer;

#[async_trait]
impl Dial for PlainDialer {
    async fn dial(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
    ) -> Result<TransportStream, ProtocolError> {
        let stream = connect_tcp(host, port, connect_timeout).await?;
        debug!(host, port, "tcp dial complete");
        Ok(TransportStream::Tcp(stream))
    }
}

/// TCP dial plus TLS handshake for `https` targets.
///
/// Handshake and certificate validation failures surface as
/// [`ProtocolError::TlsFailed`] with no plaintext fallback.
pub struct TlsDialer {
    connector: TlsConnector,
}

impl TlsDialer {
    pub fn new(policy: &TlsPolicy) -> Result<Self, ProtocolError> {
        Ok(Self {
            connector: policy.connector()?,
        })
    }
}

#[async_trait]
impl Dial for TlsDialer {
    async fn dial(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
    ) -> Result<TransportStream, ProtocolError> {
        let tcp = connect_tcp(host, port, connect_timeout).await?;
        let server_name = server_name_from_str(host)?;

        let tls = timeout_result(connect_timeout, async {
            self.connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| ProtocolError::TlsFailed(e.to_string()))
        })
        .await?;

        debug!(host, port, "tls handshake complete");
        Ok(TransportStream::Tls(tls))
    }
}

/// Pick the dial strategy for a URL scheme.
pub fn dialer_for_scheme(
    scheme: &str,
    policy: &TlsPolicy,
) -> Result<Box<dyn Dial>, ProtocolError> {
    match scheme {
        "http" => Ok(Box::new(PlainDialer)),
        "https" => Ok(Box::new(TlsDialer::new(policy)?)),
        other => Err(ProtocolError::InvalidTarget(format!(
            "Unsupported scheme: {}",
            other
        ))),
    }
}

async fn connect_tcp(
    host: &str,
    port: u16,
    connect_timeout: Option<Duration>,
) -> Result<TcpStream, ProtocolError> {
    timeout_result(connect_timeout, async {
        TcpStream::connect((host, port))
            .await
            .map_err(|e| ProtocolError::ConnectionFailed(e.to_string()))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = dialer_for_scheme("ftp", &TlsPolicy::default()).err();
        assert!(matches!(err, Some(ProtocolError::InvalidTarget(_))));
    }

    #[tokio::test]
    async fn plain_dial_against_closed_port_fails() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = PlainDialer.dial("127.0.0.1", port, None).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionFailed(_)));
    }
}
