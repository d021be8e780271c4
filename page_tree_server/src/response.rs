//! HTTP responses and the conversions used to build them.
use bytes::Bytes;
use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};
use http_body_util::Full;
use page_tree::AggregationError;
use tracing_log_error::log_error;

/// The response type returned by every handler in this crate.
pub type Response = http::Response<Full<Bytes>>;

/// Convert a type into a [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for StatusCode {
    /// A response with the given status code and an empty body.
    fn into_response(self) -> Response {
        let mut response = Response::new(Full::default());
        *response.status_mut() = self;
        response
    }
}

impl IntoResponse for AggregationError {
    /// The error message, as plain text, with the status code returned by
    /// [`AggregationError::status_code`].
    fn into_response(self) -> Response {
        plain_text(self.status_code(), self.to_string())
    }
}

/// A response with a `text/plain; charset=utf-8` body.
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = Response::new(Full::new(Bytes::from(body.into())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// A response with a JSON body.
///
/// If `body` can't be serialized, the response is a `500 Internal Server Error`.
pub fn json<T: serde::Serialize + ?Sized>(status: StatusCode, body: &T) -> Response {
    let body = match serde_json::to_vec(body) {
        Ok(body) => body,
        Err(e) => {
            log_error!(e, "Failed to serialize the response body as JSON");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
