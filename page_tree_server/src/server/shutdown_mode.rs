use std::time::Duration;

#[derive(Debug, Clone)]
#[non_exhaustive]
/// How to shut down a running server.
///
/// Check out [`ServerHandle::shutdown`](super::ServerHandle::shutdown) for more details.
pub enum ShutdownMode {
    /// Stop accepting new connections, then wait for open connections to
    /// finish serving their in-flight requests.
    ///
    /// Connections still open when `timeout` expires are dropped.
    Graceful { timeout: Duration },
    /// Drop all open connections immediately.
    Forced,
}
