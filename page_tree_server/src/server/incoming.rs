use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpStream};

/// Pending connections waiting in the kernel queue before `accept` picks them up.
const BACKLOG: i32 = 1024;

/// A stream of incoming connections, ready to be handed to a [`Server`](super::Server).
#[derive(Debug)]
pub struct IncomingStream {
    listener: TcpListener,
}

impl IncomingStream {
    /// Listen for TCP connections on `addr`.
    ///
    /// The address can be reused right after the previous listener on it
    /// was closed, e.g. when restarting the API.
    pub async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let listener = reusable_listener(addr)?;
        Ok(Self {
            listener: TcpListener::from_std(listener)?,
        })
    }

    /// The address this stream is listening on.
    ///
    /// It differs from the requested one when binding to port `0`.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub(super) async fn accept(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }
}

fn reusable_listener(addr: SocketAddr) -> std::io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    // Required by `tokio::net::TcpListener::from_std`.
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;
    Ok(socket.into())
}
