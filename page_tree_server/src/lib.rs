//! An HTTP API exposing the page tree of published projects.
//!
//! Check out [`run`] to start serving requests.
use std::sync::Arc;

use crate::routes::{Router, ServerState};
use crate::server::{Server, ServerHandle};

pub use state::{ApplicationState, build_application_state};

pub mod configuration;
pub mod response;
pub mod routes;
pub mod server;
mod state;
pub mod telemetry;

/// Start serving requests with the given state on all the sources
/// of connections registered with `server`.
pub fn run(
    server: Server,
    application_state: ApplicationState,
) -> Result<ServerHandle, matchit::InsertError> {
    let server_state = Arc::new(ServerState {
        router: Router::new()?,
        application_state,
    });
    Ok(server.serve(routes::route_request, server_state))
}
