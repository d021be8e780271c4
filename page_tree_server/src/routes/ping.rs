use http::StatusCode;

use crate::response::{IntoResponse, Response};

/// Respond with a `200 OK` and an empty body.
///
/// Use it as a health check.
pub fn ping() -> Response {
    StatusCode::OK.into_response()
}
