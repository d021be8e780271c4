use std::num::NonZeroUsize;
use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt, stream};
use http::StatusCode;

use crate::store::{BuildStore, CanvasDataLoader, CanvasDataRequest, ProjectParams, ProjectStore};
use crate::{Diagnostics, Environment, PagesDetails, ProjectId, RequestContext};

/// Only published builds are aggregated.
const PUBLISHED: Environment = Environment::Prod;

#[derive(Debug, Clone, serde::Deserialize)]
/// Tuning knobs for [`PageTreeAggregator`].
pub struct AggregatorConfig {
    /// The maximum number of canvas data loads in flight for a single aggregation.
    ///
    /// Results are always returned in the order declared by the build,
    /// regardless of the order in which loads complete.
    ///
    /// # Default
    ///
    /// 1, i.e. pages are loaded one after the other.
    #[serde(default = "AggregatorConfig::default_canvas_fetch_concurrency")]
    pub canvas_fetch_concurrency: NonZeroUsize,
}

impl AggregatorConfig {
    fn default_canvas_fetch_concurrency() -> NonZeroUsize {
        NonZeroUsize::MIN
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            canvas_fetch_concurrency: Self::default_canvas_fetch_concurrency(),
        }
    }
}

/// Collect the canvas data of every page of a project's published build.
///
/// Check out [`PageTreeAggregator::aggregate`] for more details.
pub struct PageTreeAggregator {
    builds: Arc<dyn BuildStore>,
    projects: Arc<dyn ProjectStore>,
    canvas: Arc<dyn CanvasDataLoader>,
    diagnostics: Arc<dyn Diagnostics>,
    config: AggregatorConfig,
}

impl std::fmt::Debug for PageTreeAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTreeAggregator")
            .field("builds", &self.builds)
            .field("projects", &self.projects)
            .field("canvas", &self.canvas)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PageTreeAggregator {
    pub fn new(
        builds: Arc<dyn BuildStore>,
        projects: Arc<dyn ProjectStore>,
        canvas: Arc<dyn CanvasDataLoader>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            builds,
            projects,
            canvas,
            diagnostics,
            config: AggregatorConfig::default(),
        }
    }

    /// Set the [`AggregatorConfig`] for this aggregator.
    pub fn set_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the canvas data of every page in the `prod` build of a project.
    ///
    /// The home page comes first, followed by the other pages in the order
    /// declared by the build.
    ///
    /// # Errors
    ///
    /// - [`AggregationError::MissingParameter`] if `project_id` is missing or empty.
    ///   No store is queried.
    /// - [`AggregationError::BuildNotFound`] if the project has no `prod` build.
    ///   The project store is not queried.
    /// - [`AggregationError::ProjectNotFound`] if the project store has no record for
    ///   `project_id`.
    /// - [`AggregationError::Unexpected`] for any other failure, including a single
    ///   failing canvas data load. The error is reported to [`Diagnostics`] before
    ///   being returned. No partial result is returned.
    #[tracing::instrument(name = "Aggregate page tree", skip_all, fields(project_id = ?project_id))]
    pub async fn aggregate(
        &self,
        project_id: Option<&str>,
        context: &RequestContext,
    ) -> Result<PagesDetails, AggregationError> {
        let outcome = self._aggregate(project_id, context).await;
        match &outcome {
            Ok(pages) => tracing::debug!(n_pages = pages.len(), "Aggregated page tree"),
            Err(e) if e.is_unexpected() => self.diagnostics.report(e),
            Err(_) => {}
        }
        outcome
    }

    async fn _aggregate(
        &self,
        project_id: Option<&str>,
        context: &RequestContext,
    ) -> Result<PagesDetails, AggregationError> {
        let project_id = match project_id {
            Some(id) if !id.is_empty() => ProjectId::new(id),
            _ => return Err(AggregationError::MissingParameter),
        };

        let Some(build) = self
            .builds
            .load_by_project_id(&project_id, PUBLISHED)
            .await
            .map_err(AggregationError::unexpected)?
        else {
            return Err(AggregationError::BuildNotFound { project_id });
        };

        let params = ProjectParams { project_id };
        let Some(project) = self
            .projects
            .load_by_params(&params, context)
            .await
            .map_err(AggregationError::unexpected)?
        else {
            return Err(AggregationError::ProjectNotFound);
        };

        // `buffered` preserves the order of the underlying iterator,
        // home page first.
        let project = &project;
        stream::iter(build.pages.iter())
            .map(|page| {
                let request = CanvasDataRequest {
                    project,
                    environment: PUBLISHED,
                    page_id_or_path: &page.path,
                };
                self.canvas.load(request, context)
            })
            .buffered(self.config.canvas_fetch_concurrency.get())
            .boxed()
            .try_collect::<PagesDetails>()
            .await
            .map_err(AggregationError::unexpected)
    }
}

#[derive(Debug, thiserror::Error)]
/// The error returned by [`PageTreeAggregator::aggregate`].
pub enum AggregationError {
    /// The caller didn't provide a project id.
    #[error("Required project id")]
    MissingParameter,
    /// The project has never been published.
    #[error("Project {project_id} not found or not published yet. Please contact us to get help.")]
    BuildNotFound { project_id: ProjectId },
    /// There is a published build, but no project record.
    #[error("Project not found")]
    ProjectNotFound,
    /// Something else went wrong.
    #[error(transparent)]
    Unexpected(anyhow::Error),
}

impl AggregationError {
    fn unexpected<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unexpected(anyhow::Error::from(e))
    }

    /// Returns `true` if the failure wasn't anticipated, i.e. it must be reported.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected(_))
    }

    /// The HTTP status code that best describes this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AggregationError::MissingParameter => StatusCode::BAD_REQUEST,
            AggregationError::BuildNotFound { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AggregationError::ProjectNotFound => StatusCode::NOT_FOUND,
            AggregationError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
