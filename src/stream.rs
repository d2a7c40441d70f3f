use std::cmp;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// A single dialed connection: plain TCP or a TLS session over TCP.
///
/// Implements `AsyncRead`/`AsyncWrite` by delegation so a captured connection
/// can be driven directly as a raw byte stream once the HTTP exchange is done.
#[derive(Debug)]
pub enum TransportStream {
    Tcp(TcpStream),
    Tls(TlsStream<TcpStream>),
}

impl TransportStream {
    pub fn peer_addr(&self) -> io::Result<std::net::SocketAddr> {
        match self {
            TransportStream::Tcp(tcp) => tcp.peer_addr(),
            TransportStream::Tls(tls) => tls.get_ref().0.peer_addr(),
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, TransportStream::Tls(_))
    }
}

impl AsyncRead for TransportStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransportStream::Tcp(tcp) => Pin::new(tcp).poll_read(cx, buf),
            TransportStream::Tls(tls) => Pin::new(tls).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TransportStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            TransportStream::Tcp(tcp) => Pin::new(tcp).poll_write(cx, buf),
            TransportStream::Tls(tls) => Pin::new(tls).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransportStream::Tcp(tcp) => Pin::new(tcp).poll_flush(cx),
            TransportStream::Tls(tls) => Pin::new(tls).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            TransportStream::Tcp(tcp) => Pin::new(tcp).poll_shutdown(cx),
            TransportStream::Tls(tls) => Pin::new(tls).poll_shutdown(cx),
        }
    }
}

/// The connection handed back to the caller after a round trip.
///
/// Parsing the response head reads through a buffer, which may pull in bytes
/// that belong to whatever follows the head (body, or the first bytes of an
/// upgraded protocol). Those bytes are kept here as a prefix and replayed
/// before reads hit the transport, so the caller observes the exact byte
/// sequence the socket carried. Writes go straight through.
#[derive(Debug)]
pub struct CapturedStream {
    prefix: Option<Bytes>,
    inner: TransportStream,
}

impl CapturedStream {
    pub(crate) fn new(inner: TransportStream, prefix: Bytes) -> Self {
        Self {
            prefix: if prefix.is_empty() {
                None
            } else {
                Some(prefix)
            },
            inner,
        }
    }

    /// Bytes read past the response head and not yet consumed.
    pub fn buffered(&self) -> &[u8] {
        self.prefix.as_deref().unwrap_or(&[])
    }

    pub fn get_ref(&self) -> &TransportStream {
        &self.inner
    }

    /// Unwrap into the raw transport and any unread prefix bytes.
    pub fn into_parts(self) -> (TransportStream, Bytes) {
        (self.inner, self.prefix.unwrap_or_default())
    }
}

impl AsyncRead for CapturedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Some(mut prefix) = this.prefix.take() {
            if !prefix.is_empty() {
                let n = cmp::min(prefix.len(), buf.remaining());
                buf.put_slice(&prefix[..n]);
                prefix.advance(n);
                if !prefix.is_empty() {
                    this.prefix = Some(prefix);
                }
                return Poll::Ready(Ok(()));
            }
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for CapturedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn connected_pair() -> (TransportStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (TransportStream::Tcp(client), server)
    }

    #[tokio::test]
    async fn captured_stream_replays_prefix_before_transport() {
        let (client, mut server) = connected_pair().await;
        server.write_all(b" world").await.unwrap();

        let mut captured = CapturedStream::new(client, Bytes::from_static(b"hello"));
        assert_eq!(captured.buffered(), b"hello");

        let mut buf = vec![0u8; 11];
        captured.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello world");
        assert!(captured.buffered().is_empty());
    }

    #[tokio::test]
    async fn captured_stream_serves_prefix_across_short_reads() {
        let (client, _server) = connected_pair().await;
        let mut captured = CapturedStream::new(client, Bytes::from_static(b"abcd"));

        let mut buf = [0u8; 3];
        captured.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(captured.buffered(), b"d");
    }

    #[tokio::test]
    async fn into_parts_returns_unread_prefix() {
        let (client, _server) = connected_pair().await;
        let captured = CapturedStream::new(client, Bytes::from_static(b"xyz"));
        let (_, prefix) = captured.into_parts();
        assert_eq!(&prefix[..], b"xyz");
    }
}
