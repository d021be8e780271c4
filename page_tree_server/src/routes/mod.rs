//! Request routing.
//!
//! | Method | Path                         | Handler                          |
//! |--------|------------------------------|----------------------------------|
//! | `GET`  | `/api/ping`                  | [`ping`](ping::ping)             |
//! | `GET`  | `/rest/project/{project_id}` | [`get_pages`](project::get_pages) |
//! | `GET`  | `/rest/project`              | [`get_pages`](project::get_pages) |
use std::borrow::Cow;
use std::sync::Arc;

use http::header::{ALLOW, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use page_tree::RequestId;
use percent_encoding::percent_decode_str;
use tracing::Instrument;

use crate::response::{IntoResponse, Response, plain_text};
use crate::state::ApplicationState;
use crate::telemetry::{HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, root_span};

pub mod ping;
pub mod project;

/// The header carrying the identifier assigned to each request.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Ping,
    ProjectPages,
    ProjectPagesWithoutId,
}

impl Route {
    fn template(&self) -> &'static str {
        match self {
            Route::Ping => "/api/ping",
            Route::ProjectPages => "/rest/project/{project_id}",
            Route::ProjectPagesWithoutId => "/rest/project",
        }
    }
}

/// Match request paths against the routes exposed by the API.
pub struct Router(matchit::Router<Route>);

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Router").finish_non_exhaustive()
    }
}

impl Router {
    pub fn new() -> Result<Self, matchit::InsertError> {
        let mut router = matchit::Router::new();
        for route in [
            Route::Ping,
            Route::ProjectPages,
            Route::ProjectPagesWithoutId,
        ] {
            router.insert(route.template(), route)?;
        }
        Ok(Self(router))
    }
}

/// The state shared by all requests handled by the server.
#[derive(Debug)]
pub struct ServerState {
    pub router: Router,
    pub application_state: ApplicationState,
}

/// Dispatch an incoming request to the matching handler.
///
/// Every response carries an `x-request-id` header, and the processing of each
/// request happens inside a root span (see [`root_span`]).
pub async fn route_request(
    request: http::Request<hyper::body::Incoming>,
    server_state: Arc<ServerState>,
) -> Response {
    let request_id = RequestId::generate();
    let (head, _body) = request.into_parts();
    let root_span = root_span(&head, request_id);

    let mut response = dispatch(&head, request_id, &server_state)
        .instrument(root_span.clone())
        .await;

    root_span.record(HTTP_RESPONSE_STATUS_CODE, response.status().as_u16());
    let request_id = request_id.to_string();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}

async fn dispatch(
    head: &http::request::Parts,
    request_id: RequestId,
    server_state: &ServerState,
) -> Response {
    let Ok(matched) = server_state.router.0.at(head.uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let route = *matched.value;
    tracing::Span::current().record(HTTP_ROUTE, route.template());

    if head.method != Method::GET {
        let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET"));
        return response;
    }

    let application_state = &server_state.application_state;
    match route {
        Route::Ping => ping::ping(),
        Route::ProjectPagesWithoutId => {
            project::get_pages(None, request_id, application_state).await
        }
        Route::ProjectPages => {
            let raw = matched.params.get("project_id").unwrap_or_default();
            match decode_path_parameter("project_id", raw) {
                Ok(project_id) => {
                    project::get_pages(Some(&project_id), request_id, application_state).await
                }
                Err(e) => plain_text(StatusCode::BAD_REQUEST, e.to_string()),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{name}` is not valid UTF-8 once percent-decoded")]
/// A path parameter couldn't be percent-decoded into a valid UTF-8 string.
pub struct InvalidPathParameter {
    name: &'static str,
    #[source]
    source: std::str::Utf8Error,
}

fn decode_path_parameter<'a>(
    name: &'static str,
    raw: &'a str,
) -> Result<Cow<'a, str>, InvalidPathParameter> {
    percent_decode_str(raw)
        .decode_utf8()
        .map_err(|source| InvalidPathParameter { name, source })
}
