//! Accept TCP connections and serve HTTP requests over them.
//!
//! # Example
//!
//! ```rust,no_run
//! use page_tree_server::response::Response;
//! use page_tree_server::server::{Server, ShutdownMode};
//!
//! async fn handler(_request: http::Request<hyper::body::Incoming>, _state: ()) -> Response {
//!     page_tree_server::response::plain_text(http::StatusCode::OK, "Hello!")
//! }
//!
//! # async fn run() -> std::io::Result<()> {
//! let handle = Server::new()
//!     .bind("127.0.0.1:8080".parse().unwrap())
//!     .await?
//!     .serve(handler, ());
//! // [...]
//! handle.shutdown(ShutdownMode::Forced).await;
//! # Ok(())
//! # }
//! ```
pub use incoming::IncomingStream;
pub use server::Server;
pub use server_handle::ServerHandle;
pub use shutdown_mode::ShutdownMode;

mod incoming;
#[allow(clippy::module_inception)]
mod server;
mod server_handle;
mod shutdown_mode;
