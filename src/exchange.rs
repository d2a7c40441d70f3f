use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::dialer::Dial;
use crate::stream::{CapturedStream, TransportStream};
use crate::types::{ClientTimeouts, Header, HijackedResponse, ProtocolError, Request};
use crate::utils::{
    ensure_user_agent, parse_header, parse_status_line, timeout_result, CONTENT_LENGTH_HEADER,
    CRLF, HOST_HEADER, HTTP_VERSION_1_1,
};

/// Single-use execution engine. One is created per call and never shared;
/// it owns the capture slot for the connection the dialer opens, performs
/// exactly one HTTP round trip on it, and ends by moving the connection
/// out into the response. Sharing one of these across requests would
/// reintroduce the pooling semantics this crate exists to avoid.
pub(crate) struct Exchange {
    timeouts: ClientTimeouts,
    // None until the dial succeeds.
    captured: Option<TransportStream>,
}

struct ResponseHead {
    status: u16,
    protocol: String,
    headers: Vec<Header>,
    // Bytes the head parser buffered past the blank line.
    leftover: Bytes,
}

impl Exchange {
    pub(crate) fn new(timeouts: ClientTimeouts) -> Self {
        Self {
            timeouts,
            captured: None,
        }
    }

    pub(crate) async fn run(
        mut self,
        dialer: &dyn Dial,
        request: &Request,
    ) -> Result<HijackedResponse, ProtocolError> {
        let host = request
            .target
            .host()
            .ok_or_else(|| ProtocolError::InvalidTarget("Target missing host".to_string()))?;
        let port = request
            .target
            .port()
            .ok_or_else(|| ProtocolError::InvalidTarget("Target missing port".to_string()))?;

        let stream = dialer.dial(host, port, self.timeouts.connect).await?;
        self.captured = Some(stream);

        match self.round_trip(request).await {
            Ok(head) => {
                let stream = match self.captured.take() {
                    Some(stream) => stream,
                    None => {
                        return Err(ProtocolError::RequestFailed(
                            "Connection slot empty after round trip".to_string(),
                        ))
                    }
                };
                debug!(status = head.status, "response head received");
                Ok(HijackedResponse::new(
                    head.status,
                    head.protocol,
                    head.headers,
                    request.method.clone(),
                    CapturedStream::new(stream, head.leftover),
                ))
            }
            Err(e) => {
                // The caller can never reach a connection that produced no
                // response, so shut it down rather than leak it.
                if let Some(mut stream) = self.captured.take() {
                    let _ = stream.shutdown().await;
                }
                Err(e)
            }
        }
    }

    async fn round_trip(&mut self, request: &Request) -> Result<ResponseHead, ProtocolError> {
        let stream = match self.captured.as_mut() {
            Some(stream) => stream,
            None => {
                return Err(ProtocolError::RequestFailed(
                    "Round trip started without a connection".to_string(),
                ))
            }
        };

        let wire = serialize_request(request);
        timeout_result(self.timeouts.write, async {
            stream.write_all(&wire).await.map_err(ProtocolError::Io)
        })
        .await?;

        read_head(stream, self.timeouts.read).await
    }
}

/// Serialize the request line, headers, and body into wire bytes.
///
/// Host and User-Agent are synthesized when absent; Content-Length is added
/// for a body unless the caller set their own. Nothing else is touched, so a
/// caller-supplied `Connection: Upgrade` goes out exactly as written.
fn serialize_request(request: &Request) -> Vec<u8> {
    let mut wire = Vec::new();

    wire.extend_from_slice(
        format!(
            "{} {} {}{}",
            request.method,
            request.target.path_query(),
            HTTP_VERSION_1_1,
            CRLF
        )
        .as_bytes(),
    );

    let mut headers = request.headers.clone();
    ensure_user_agent(&mut headers);

    if !headers.iter().any(|h| h.is(HOST_HEADER)) {
        let authority = request
            .target
            .authority()
            .unwrap_or_else(|| request.target.host().unwrap_or_default().to_string());
        headers.push(Header::new(HOST_HEADER, authority));
    }

    if let Some(body) = request.body.as_ref() {
        if !headers.iter().any(|h| h.is(CONTENT_LENGTH_HEADER)) {
            headers.push(Header::new(CONTENT_LENGTH_HEADER, body.len().to_string()));
        }
    }

    for header in &headers {
        wire.extend_from_slice(format!("{}{}", header, CRLF).as_bytes());
    }
    wire.extend_from_slice(CRLF.as_bytes());

    if let Some(body) = request.body.as_ref() {
        wire.extend_from_slice(body);
    }

    wire
}

/// Read status line and header block, stopping at the blank line. Body bytes
/// the buffer pulled in alongside the head are returned as `leftover` so the
/// captured stream can replay them.
async fn read_head(
    stream: &mut TransportStream,
    read_timeout: Option<Duration>,
) -> Result<ResponseHead, ProtocolError> {
    let mut reader = BufReader::new(stream);

    let mut status_line = String::new();
    let n = timeout_result(read_timeout, read_head_line(&mut reader, &mut status_line)).await?;
    if n == 0 {
        return Err(ProtocolError::ConnectionFailed(
            "Connection closed by server before receiving response".to_string(),
        ));
    }
    let (status, protocol) = parse_status_line(&status_line)?;

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        let n = timeout_result(read_timeout, read_head_line(&mut reader, &mut line)).await?;
        if n == 0 {
            return Err(ProtocolError::InvalidResponse(
                "Connection closed inside header block".to_string(),
            ));
        }
        if line.trim().is_empty() {
            break;
        }
        if let Some(header) = parse_header(&line) {
            headers.push(header);
        }
    }

    let leftover = Bytes::copy_from_slice(reader.buffer());

    Ok(ResponseHead {
        status,
        protocol,
        headers,
        leftover,
    })
}

async fn read_head_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    line: &mut String,
) -> Result<usize, ProtocolError> {
    match reader.read_line(line).await {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(ProtocolError::InvalidResponse(
            "Response head is not valid UTF-8".to_string(),
        )),
        Err(e) => Err(ProtocolError::Io(e)),
    }
}
