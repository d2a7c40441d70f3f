#[derive(Debug)]
pub enum ProtocolError {
    ConnectionFailed(String),
    TlsFailed(String),
    RequestFailed(String),
    InvalidResponse(String),
    MalformedHeaders(String),
    InvalidTarget(String),
    Timeout,
    Io(std::io::Error),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            ProtocolError::TlsFailed(msg) => write!(f, "TLS failure: {}", msg),
            ProtocolError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            ProtocolError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProtocolError::MalformedHeaders(msg) => write!(f, "Malformed headers: {}", msg),
            ProtocolError::InvalidTarget(msg) => write!(f, "Invalid target: {}", msg),
            ProtocolError::Timeout => write!(f, "Request timeout"),
            ProtocolError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Io(err)
    }
}
