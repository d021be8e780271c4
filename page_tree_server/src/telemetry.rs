//! Logging setup and the root span that wraps every request.
use anyhow::Context;
use page_tree::RequestId;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

/// The name of the span field holding the route template that matched the request.
pub const HTTP_ROUTE: &str = "http.route";
/// The name of the span field holding the response status code.
pub const HTTP_RESPONSE_STATUS_CODE: &str = "http.response.status_code";

/// Build a subscriber that formats log events and writes them to `sink`.
///
/// The `RUST_LOG` environment variable takes precedence over `default_filter`.
pub fn get_subscriber<Sink>(
    default_filter: &str,
    sink: Sink,
) -> impl Subscriber + Send + Sync + 'static
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(sink)
        .with_target(false);
    Registry::default().with(env_filter).with(fmt_layer)
}

/// Register a subscriber as global default to process span data.
///
/// It should only be called once!
pub fn init_telemetry(
    subscriber: impl Subscriber + Send + Sync + 'static,
) -> Result<(), anyhow::Error> {
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install a global `tracing` subscriber")
}

/// The span that wraps the processing of an incoming request.
///
/// [`HTTP_ROUTE`] and [`HTTP_RESPONSE_STATUS_CODE`] are recorded later,
/// once known.
pub fn root_span(head: &http::request::Parts, request_id: RequestId) -> tracing::Span {
    tracing::info_span!(
        "HTTP request",
        http.request.method = http_request_method(&head.method),
        http.request.server_id = %request_id,
        url.path = head.uri.path(),
        url.query = head.uri.query().unwrap_or_default(),
        network.protocol.version = http_version(head.version),
        http.route = tracing::field::Empty,
        http.response.status_code = tracing::field::Empty,
    )
}

fn http_request_method(method: &http::Method) -> &'static str {
    use http::Method;

    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PATCH => "PATCH",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        Method::CONNECT => "CONNECT",
        Method::TRACE => "TRACE",
        _ => "_OTHER",
    }
}

fn http_version(version: http::Version) -> &'static str {
    use http::Version;

    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "unknown",
    }
}
