use http::StatusCode;
use page_tree::{Environment, RequestContext, RequestId};

use crate::response::{IntoResponse, Response, json};
use crate::state::ApplicationState;

/// Return the canvas data of every page in the published build of a project,
/// as a JSON array, home page first.
///
/// Failures are rendered as plain text, with the status code
/// of the underlying [`AggregationError`](page_tree::AggregationError).
pub async fn get_pages(
    project_id: Option<&str>,
    request_id: RequestId,
    application_state: &ApplicationState,
) -> Response {
    let context = RequestContext::new(request_id, Environment::Prod);
    match application_state
        .aggregator
        .aggregate(project_id, &context)
        .await
    {
        Ok(pages) => json(StatusCode::OK, &pages),
        Err(e) => e.into_response(),
    }
}
