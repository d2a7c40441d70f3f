use bytes::Bytes;
use tokio::io::AsyncReadExt;

use crate::stream::CapturedStream;
use crate::utils::{
    header_value, CHUNKED_ENCODING, CONTENT_LENGTH_HEADER, TRANSFER_ENCODING_HEADER,
};

use super::error::ProtocolError;
use super::header::Header;

/// A parsed response head paired with the connection it arrived on.
///
/// One of these exists only after a successful dial, request write, and head
/// read, so the captured connection is always present. The body is not read
/// ahead of time; it stays on the wire, reachable through the captured stream
/// or the [`read_body`](Self::read_body) helper. Nothing here ever closes the
/// connection.
#[derive(Debug)]
pub struct HijackedResponse {
    pub status: u16,
    pub protocol: String,
    pub headers: Vec<Header>,
    request_method: String,
    stream: CapturedStream,
}

impl HijackedResponse {
    pub(crate) fn new(
        status: u16,
        protocol: String,
        headers: Vec<Header>,
        request_method: String,
        stream: CapturedStream,
    ) -> Self {
        Self {
            status,
            protocol,
            headers,
            request_method,
            stream,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    /// The captured connection. Idempotent: every call returns the same
    /// handle, and it never blocks or fails. Mixing reads here with
    /// [`read_body`](Self::read_body) is the caller's risk.
    pub fn stream_mut(&mut self) -> &mut CapturedStream {
        &mut self.stream
    }

    /// Take ownership of the captured connection. After this the crate holds
    /// no reference to it; closing it is entirely the caller's business.
    pub fn into_stream(self) -> CapturedStream {
        self.stream
    }

    /// Drain the message body from the captured connection.
    ///
    /// Honors `Content-Length` and chunked transfer coding (chunked trailers
    /// are consumed and discarded); with neither present, reads until the
    /// server closes. Statuses that carry no body (1xx, 204, 304) and HEAD
    /// responses yield empty bytes without touching the stream, which keeps a
    /// `101` upgrade's follow-on bytes intact.
    pub async fn read_body(&mut self) -> Result<Bytes, ProtocolError> {
        if !self.has_body() {
            return Ok(Bytes::new());
        }

        if self.is_chunked() {
            return self.read_chunked_body().await;
        }

        match self.content_length()? {
            Some(length) => {
                let mut body = vec![0u8; length];
                self.stream
                    .read_exact(&mut body)
                    .await
                    .map_err(ProtocolError::Io)?;
                Ok(Bytes::from(body))
            }
            None => {
                let mut body = Vec::new();
                self.stream
                    .read_to_end(&mut body)
                    .await
                    .map_err(ProtocolError::Io)?;
                Ok(Bytes::from(body))
            }
        }
    }

    fn has_body(&self) -> bool {
        if self.request_method.eq_ignore_ascii_case("HEAD") {
            return false;
        }
        !matches!(self.status, 100..=199 | 204 | 304)
    }

    fn is_chunked(&self) -> bool {
        self.header(TRANSFER_ENCODING_HEADER)
            .map_or(false, |v| v.to_lowercase().contains(CHUNKED_ENCODING))
    }

    fn content_length(&self) -> Result<Option<usize>, ProtocolError> {
        match self.header(CONTENT_LENGTH_HEADER) {
            Some(value) => value.trim().parse::<usize>().map(Some).map_err(|_| {
                ProtocolError::InvalidResponse(format!("Invalid content-length '{}'", value))
            }),
            None => Ok(None),
        }
    }

    async fn read_chunked_body(&mut self) -> Result<Bytes, ProtocolError> {
        let mut body = Vec::new();
        loop {
            let line = self.read_wire_line().await?;
            let size_text = line.split(';').next().unwrap_or("").trim();
            let size = usize::from_str_radix(size_text, 16).map_err(|_| {
                ProtocolError::InvalidResponse(format!("Invalid chunk size '{}'", size_text))
            })?;
            if size == 0 {
                break;
            }

            let start = body.len();
            body.resize(start + size, 0);
            self.stream
                .read_exact(&mut body[start..])
                .await
                .map_err(ProtocolError::Io)?;

            let mut crlf = [0u8; 2];
            self.stream
                .read_exact(&mut crlf)
                .await
                .map_err(ProtocolError::Io)?;
        }

        // Trailer block: consume lines up to the terminating blank line.
        loop {
            if self.read_wire_line().await?.is_empty() {
                break;
            }
        }

        Ok(Bytes::from(body))
    }

    // Byte-at-a-time CRLF line read. Avoids buffered over-read so the stream
    // position stays exact for whoever reads next.
    async fn read_wire_line(&mut self) -> Result<String, ProtocolError> {
        let mut line = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            self.stream
                .read_exact(&mut byte)
                .await
                .map_err(ProtocolError::Io)?;
            if byte[0] == b'\n' {
                break;
            }
            line.push(byte[0]);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8(line).map_err(|_| {
            ProtocolError::InvalidResponse("Chunk metadata is not valid UTF-8".to_string())
        })
    }
}
