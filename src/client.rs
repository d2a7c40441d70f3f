use tracing::debug;

use crate::dialer::dialer_for_scheme;
use crate::exchange::Exchange;
use crate::tls::TlsPolicy;
use crate::types::{ClientTimeouts, HijackedResponse, ProtocolError, Request};

/// HTTP/1.1 client that hands the live connection back with every response.
///
/// Each call to [`send_request`](Self::send_request) dials exactly one fresh
/// connection, runs a single round trip on it through a single-use engine,
/// and returns the parsed head together with the connection. There is no
/// pool, no reuse across calls, and no automatic close: once the response is
/// returned the connection belongs to the caller.
///
/// The client itself is immutable, so one instance (typically behind an
/// `Arc`) can serve any number of concurrent calls; each owns its own engine
/// and connection.
pub struct HijackClient {
    tls: TlsPolicy,
    timeouts: ClientTimeouts,
}

impl HijackClient {
    pub fn new() -> Self {
        Self::with_tls_policy(TlsPolicy::default())
    }

    pub fn with_tls_policy(tls: TlsPolicy) -> Self {
        Self {
            tls,
            timeouts: ClientTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ClientTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn tls_policy(&self) -> &TlsPolicy {
        &self.tls
    }

    /// Execute one request and capture the connection it ran on.
    ///
    /// The target scheme selects the dial strategy: `http` dials plain TCP,
    /// `https` adds a TLS handshake under this client's policy. No redirect
    /// is followed and nothing is retried; the first failure at any phase
    /// (dial, handshake, write, head read) is returned as-is, with no
    /// partial response. A connection that was already open when a later
    /// phase failed is shut down rather than leaked.
    pub async fn send_request(&self, request: Request) -> Result<HijackedResponse, ProtocolError> {
        let dialer = dialer_for_scheme(request.target.scheme(), &self.tls)?;
        let timeouts = request.effective_timeouts(&self.timeouts);

        debug!(url = %request.target, method = %request.method, "dispatching request");
        Exchange::new(timeouts).run(dialer.as_ref(), &request).await
    }
}

impl Default for HijackClient {
    fn default() -> Self {
        Self::new()
    }
}
