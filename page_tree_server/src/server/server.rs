use std::future::Future;
use std::net::SocketAddr;

use crate::response::Response;

use super::{IncomingStream, ServerHandle};

/// An HTTP server to handle incoming connections.
///
/// Register one or more sources of connections with [`Server::bind`]
/// or [`Server::listen`], then start it with [`Server::serve`].
#[must_use = "You must call `serve` on a `Server` to start listening for incoming connections"]
#[derive(Debug, Default)]
pub struct Server {
    incoming: Vec<IncomingStream>,
}

impl Server {
    /// Create a new [`Server`] with no sources of connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the server to the given address and start listening for incoming connections.
    ///
    /// You can call this method multiple times to listen on multiple addresses.
    pub async fn bind(mut self, addr: SocketAddr) -> std::io::Result<Self> {
        let incoming = IncomingStream::bind(addr).await?;
        self.incoming.push(incoming);
        Ok(self)
    }

    /// Ask the server to process connections from an [`IncomingStream`]
    /// that has already been bound.
    pub fn listen(mut self, incoming: IncomingStream) -> Self {
        self.incoming.push(incoming);
        self
    }

    /// Start listening for incoming connections.
    ///
    /// `handler` is invoked, with a clone of `state`, for every incoming request.
    /// The returned [`ServerHandle`] can be used to shut the server down.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a `tokio` runtime.
    pub fn serve<HandlerFuture, State>(
        self,
        handler: fn(http::Request<hyper::body::Incoming>, State) -> HandlerFuture,
        state: State,
    ) -> ServerHandle
    where
        HandlerFuture: Future<Output = Response> + Send + 'static,
        State: Clone + Send + Sync + 'static,
    {
        ServerHandle::new(self.incoming, handler, state)
    }
}
