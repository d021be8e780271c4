use tracing_log_error::log_error;

/// Where failures that nobody anticipated are reported.
///
/// It is initialised once, when the process starts, and shared by every request.
pub trait Diagnostics: Send + Sync {
    /// Report an error.
    fn report(&self, error: &(dyn std::error::Error + 'static));
}

/// A [`Diagnostics`] sink that emits an `ERROR` event via `tracing`,
/// populating the conventional `error.*` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, error: &(dyn std::error::Error + 'static)) {
        log_error!(error, "An unexpected error occurred");
    }
}
