use std::convert::Infallible;
use std::future::{Future, IntoFuture, poll_fn};
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::Poll;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tracing_log_error::log_error;

use crate::response::Response;

use super::{IncomingStream, ShutdownMode};

/// A handle to a running [`Server`](super::Server).
///
/// Await it to wait until the server stops, or call [`ServerHandle::shutdown`]
/// to stop it.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    command_outbox: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    pub(super) fn new<HandlerFuture, State>(
        incoming: Vec<IncomingStream>,
        handler: fn(http::Request<hyper::body::Incoming>, State) -> HandlerFuture,
        state: State,
    ) -> Self
    where
        HandlerFuture: Future<Output = Response> + Send + 'static,
        State: Clone + Send + Sync + 'static,
    {
        let (command_outbox, command_inbox) = mpsc::channel(32);
        let acceptor = Acceptor {
            command_inbox,
            incoming,
            handler,
            state,
            handler_output_future: PhantomData,
        };
        tokio::spawn(acceptor.run());
        Self { command_outbox }
    }

    /// Instruct the server to stop accepting new connections and shut down.
    ///
    /// The returned future resolves once the shutdown has completed,
    /// according to the chosen [`ShutdownMode`].
    #[doc(alias("stop"))]
    pub async fn shutdown(self, mode: ShutdownMode) {
        let (completion_notifier, completion) = oneshot::channel();
        if self
            .command_outbox
            .send(ServerCommand::Shutdown {
                completion_notifier,
                mode,
            })
            .await
            .is_ok()
        {
            // Sending only fails if the acceptor has already exited.
            let _ = completion.await;
        }
    }
}

impl IntoFuture for ServerHandle {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = ()> + Send + Sync + 'static>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.command_outbox.closed().await })
    }
}

#[derive(Debug)]
enum ServerCommand {
    Shutdown {
        completion_notifier: oneshot::Sender<()>,
        mode: ShutdownMode,
    },
}

type Accepted = (IncomingStream, TcpStream, SocketAddr);

enum AcceptorInboxMessage {
    ServerCommand(ServerCommand),
    Connection(Option<Result<Accepted, JoinError>>),
}

#[must_use]
struct Acceptor<HandlerFuture, State> {
    command_inbox: mpsc::Receiver<ServerCommand>,
    incoming: Vec<IncomingStream>,
    handler: fn(http::Request<hyper::body::Incoming>, State) -> HandlerFuture,
    state: State,
    // `fn() -> HandlerFuture` keeps `Acceptor` `Send` regardless of `HandlerFuture`.
    handler_output_future: PhantomData<fn() -> HandlerFuture>,
}

impl<HandlerFuture, State> Acceptor<HandlerFuture, State>
where
    HandlerFuture: Future<Output = Response> + Send + 'static,
    State: Clone + Send + Sync + 'static,
{
    async fn run(self) {
        async fn accept_connection(incoming: IncomingStream) -> Accepted {
            loop {
                match incoming.accept().await {
                    Ok((connection, remote_peer)) => return (incoming, connection, remote_peer),
                    Err(e) => {
                        log_error!(e, level: tracing::Level::WARN, "Failed to accept connection");
                        continue;
                    }
                }
            }
        }

        let Self {
            mut command_inbox,
            incoming,
            handler,
            state,
            handler_output_future: _,
        } = self;

        let mut incoming_join_set = JoinSet::new();
        for incoming in incoming {
            incoming_join_set.spawn(accept_connection(incoming));
        }

        let http = auto::Builder::new(TokioExecutor::new());
        let (shutdown_signal, shutdown_listener) = watch::channel(false);
        let mut connections = JoinSet::new();

        loop {
            let message =
                poll_fn(|cx| Self::poll_inboxes(cx, &mut command_inbox, &mut incoming_join_set))
                    .await;
            match message {
                AcceptorInboxMessage::ServerCommand(ServerCommand::Shutdown {
                    completion_notifier,
                    mode,
                }) => {
                    Self::shutdown(
                        completion_notifier,
                        mode,
                        incoming_join_set,
                        connections,
                        shutdown_signal,
                    )
                    .await;
                    return;
                }
                AcceptorInboxMessage::Connection(None) => {
                    tracing::warn!("There are no sources of incoming connections, the server will exit now");
                    return;
                }
                AcceptorInboxMessage::Connection(Some(Err(e))) => {
                    log_error!(
                        e,
                        "Failed to accept new connections. The acceptor will exit now."
                    );
                    return;
                }
                AcceptorInboxMessage::Connection(Some(Ok((incoming, stream, remote_peer)))) => {
                    // Keep listening on the same source.
                    incoming_join_set.spawn(accept_connection(incoming));
                    // Reap connections that have already been closed.
                    while connections.try_join_next().is_some() {}
                    connections.spawn(serve_connection(
                        http.clone(),
                        stream,
                        remote_peer,
                        handler,
                        state.clone(),
                        shutdown_listener.clone(),
                    ));
                }
            }
        }
    }

    /// Check if there is work to be done.
    fn poll_inboxes(
        cx: &mut std::task::Context<'_>,
        command_inbox: &mut mpsc::Receiver<ServerCommand>,
        incoming_join_set: &mut JoinSet<Accepted>,
    ) -> Poll<AcceptorInboxMessage> {
        // Shutdown commands take priority over incoming connections.
        if let Poll::Ready(Some(message)) = command_inbox.poll_recv(cx) {
            return Poll::Ready(AcceptorInboxMessage::ServerCommand(message));
        }
        if let Poll::Ready(message) = incoming_join_set.poll_join_next(cx) {
            return Poll::Ready(AcceptorInboxMessage::Connection(message));
        }
        Poll::Pending
    }

    async fn shutdown(
        completion_notifier: oneshot::Sender<()>,
        mode: ShutdownMode,
        incoming_join_set: JoinSet<Accepted>,
        mut connections: JoinSet<()>,
        shutdown_signal: watch::Sender<bool>,
    ) {
        // Dropping the `JoinSet` cancels the accept loops, which in turn
        // drops the listeners and closes their sockets.
        drop(incoming_join_set);

        if let ShutdownMode::Graceful { timeout } = mode {
            let _ = shutdown_signal.send(true);
            let drained = tokio::time::timeout(timeout, async {
                while connections.join_next().await.is_some() {}
            })
            .await;
            if drained.is_err() {
                tracing::warn!(
                    n_connections = connections.len(),
                    "Graceful shutdown timed out, dropping the remaining connections"
                );
            }
        }
        connections.shutdown().await;

        let _ = completion_notifier.send(());
    }
}

async fn serve_connection<HandlerFuture, State>(
    http: auto::Builder<TokioExecutor>,
    stream: TcpStream,
    remote_peer: SocketAddr,
    handler: fn(http::Request<hyper::body::Incoming>, State) -> HandlerFuture,
    state: State,
    mut shutdown_listener: watch::Receiver<bool>,
) where
    HandlerFuture: Future<Output = Response> + Send + 'static,
    State: Clone + Send + Sync + 'static,
{
    let service = hyper::service::service_fn(move |request| {
        let response = handler(request, state.clone());
        async move { Ok::<_, Infallible>(response.await) }
    });
    let connection = http.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let outcome = tokio::select! {
        outcome = connection.as_mut() => outcome,
        _ = shutdown_listener.changed() => {
            // Finish in-flight requests, then close.
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    };
    if let Err(e) = outcome {
        let e: &(dyn std::error::Error + Send + Sync + 'static) = &*e;
        log_error!(
            e,
            level: tracing::Level::WARN,
            "Failed to serve a connection from {}",
            remote_peer
        );
    }
}
