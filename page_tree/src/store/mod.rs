//! The collaborators the aggregator reads from.
//!
//! Each trait is object-safe, so that the concrete backend can be chosen at
//! runtime and shared as an `Arc<dyn ...>`.
use crate::{Build, CanvasData, Environment, Project, ProjectId, RequestContext};

pub use memory::InMemoryStore;
pub use snapshot::Snapshot;

mod memory;
mod snapshot;

/// Resolve builds for a project.
#[async_trait::async_trait]
pub trait BuildStore: Send + Sync + std::fmt::Debug {
    /// Load the build of a project for the given environment.
    ///
    /// It returns `None` if the project has never been built for that
    /// environment, e.g. a project that hasn't been published yet has no
    /// `prod` build.
    async fn load_by_project_id(
        &self,
        project_id: &ProjectId,
        environment: Environment,
    ) -> Result<Option<Build>, errors::LoadError>;
}

/// The lookup parameters accepted by [`ProjectStore::load_by_params`].
#[derive(Debug, Clone)]
pub struct ProjectParams {
    pub project_id: ProjectId,
}

/// Resolve project metadata.
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync + std::fmt::Debug {
    /// Load a project.
    ///
    /// It returns `None` if there is no project matching `params`.
    async fn load_by_params(
        &self,
        params: &ProjectParams,
        context: &RequestContext,
    ) -> Result<Option<Project>, errors::LoadError>;
}

/// What [`CanvasDataLoader::load`] needs to locate a page.
#[derive(Debug, Clone, Copy)]
pub struct CanvasDataRequest<'a> {
    pub project: &'a Project,
    pub environment: Environment,
    /// Either the id or the path of the page.
    pub page_id_or_path: &'a str,
}

/// Assemble the canvas data for a single page.
#[async_trait::async_trait]
pub trait CanvasDataLoader: Send + Sync + std::fmt::Debug {
    async fn load(
        &self,
        request: CanvasDataRequest<'_>,
        context: &RequestContext,
    ) -> Result<CanvasData, errors::LoadCanvasDataError>;
}

/// Errors that can occur when reading from a store.
pub mod errors {
    use crate::{Environment, ProjectId};

    #[non_exhaustive]
    #[derive(Debug, thiserror::Error)]
    /// The error returned by [`BuildStore`](super::BuildStore) and
    /// [`ProjectStore`](super::ProjectStore).
    pub enum LoadError {
        /// The stored record doesn't have the expected shape.
        #[error("Failed to deserialize the stored record.")]
        DeserializationError(#[from] serde_json::Error),
        /// Something else went wrong when loading the record.
        #[error(transparent)]
        Other(anyhow::Error),
    }

    #[non_exhaustive]
    #[derive(Debug, thiserror::Error)]
    /// The error returned by [`CanvasDataLoader::load`](super::CanvasDataLoader::load).
    pub enum LoadCanvasDataError {
        #[error(transparent)]
        BuildNotFound(#[from] BuildNotFoundError),
        #[error(transparent)]
        PageNotFound(#[from] PageNotFoundError),
        #[error(transparent)]
        TreeNotFound(#[from] TreeNotFoundError),
        #[error("Failed to serialize the canvas data.")]
        SerializationError(#[from] serde_json::Error),
        #[error(transparent)]
        Load(#[from] LoadError),
    }

    #[derive(Debug, thiserror::Error)]
    #[error("There is no `{environment}` build for project {project_id}")]
    pub struct BuildNotFoundError {
        pub project_id: ProjectId,
        pub environment: Environment,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Page `{page_id_or_path}` doesn't exist in build {build_id}")]
    pub struct PageNotFoundError {
        pub build_id: String,
        pub page_id_or_path: String,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Instance tree {tree_id} for page `{page_id}` doesn't exist")]
    pub struct TreeNotFoundError {
        pub tree_id: String,
        pub page_id: String,
    }
}
