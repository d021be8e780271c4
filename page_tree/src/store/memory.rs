use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::errors::{
    BuildNotFoundError, LoadCanvasDataError, LoadError, PageNotFoundError, TreeNotFoundError,
};
use super::{
    BuildStore, CanvasDataLoader, CanvasDataRequest, ProjectParams, ProjectStore, Snapshot,
};
use crate::instance_tree::{InstanceProps, Tree};
use crate::{Build, CanvasData, Environment, Page, Project, ProjectId, RequestContext};

#[derive(Clone, Default)]
/// An in-memory store for projects, builds and instance trees.
///
/// It implements [`BuildStore`], [`ProjectStore`] and [`CanvasDataLoader`].
///
/// # Limitations
///
/// This store won't persist data between server restarts.
/// It is primarily intended for testing, local development and serving
/// read-only [`Snapshot`]s.
pub struct InMemoryStore(Arc<RwLock<Catalog>>);

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Catalog {
    projects: HashMap<ProjectId, Project>,
    builds: HashMap<(ProjectId, Environment), Build>,
    trees: HashMap<String, Tree>,
    // Keyed by tree id, in insertion order.
    props: HashMap<String, Vec<InstanceProps>>,
}

/// The canvas data assembled for a single page.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PageCanvas<'a> {
    build_id: &'a str,
    page: &'a Page,
    tree: &'a Tree,
    props: &'a [InstanceProps],
}

impl InMemoryStore {
    /// Creates a new (empty) in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the content of a [`Snapshot`].
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            projects,
            builds,
            trees,
            props,
        } = snapshot;
        let mut catalog = Catalog::default();
        for project in projects {
            catalog.projects.insert(project.id.clone(), project);
        }
        for build in builds {
            catalog
                .builds
                .insert((build.project_id.clone(), build.environment), build);
        }
        for tree in trees {
            catalog.trees.insert(tree.id.clone(), tree);
        }
        for instance_props in props {
            catalog
                .props
                .entry(instance_props.tree_id.clone())
                .or_default()
                .push(instance_props);
        }
        Self(Arc::new(RwLock::new(catalog)))
    }

    pub async fn insert_project(&self, project: Project) {
        let mut guard = self.0.write().await;
        guard.projects.insert(project.id.clone(), project);
    }

    /// Store a build.
    ///
    /// It replaces the previous build for the same project and environment, if any.
    pub async fn insert_build(&self, build: Build) {
        let mut guard = self.0.write().await;
        guard
            .builds
            .insert((build.project_id.clone(), build.environment), build);
    }

    pub async fn insert_tree(&self, tree: Tree) {
        let mut guard = self.0.write().await;
        guard.trees.insert(tree.id.clone(), tree);
    }

    pub async fn insert_props(&self, props: InstanceProps) {
        let mut guard = self.0.write().await;
        guard
            .props
            .entry(props.tree_id.clone())
            .or_default()
            .push(props);
    }
}

#[async_trait::async_trait]
impl BuildStore for InMemoryStore {
    #[tracing::instrument(name = "Load build", level = tracing::Level::TRACE, skip_all, fields(project_id = %project_id, environment = %environment))]
    async fn load_by_project_id(
        &self,
        project_id: &ProjectId,
        environment: Environment,
    ) -> Result<Option<Build>, LoadError> {
        let guard = self.0.read().await;
        Ok(guard
            .builds
            .get(&(project_id.to_owned(), environment))
            .cloned())
    }
}

#[async_trait::async_trait]
impl ProjectStore for InMemoryStore {
    #[tracing::instrument(name = "Load project", level = tracing::Level::TRACE, skip_all, fields(project_id = %params.project_id))]
    async fn load_by_params(
        &self,
        params: &ProjectParams,
        _context: &RequestContext,
    ) -> Result<Option<Project>, LoadError> {
        let guard = self.0.read().await;
        Ok(guard.projects.get(&params.project_id).cloned())
    }
}

#[async_trait::async_trait]
impl CanvasDataLoader for InMemoryStore {
    #[tracing::instrument(name = "Load canvas data", level = tracing::Level::TRACE, skip_all, fields(page = %request.page_id_or_path))]
    async fn load(
        &self,
        request: CanvasDataRequest<'_>,
        _context: &RequestContext,
    ) -> Result<CanvasData, LoadCanvasDataError> {
        let guard = self.0.read().await;
        let project_id = &request.project.id;
        let Some(build) = guard
            .builds
            .get(&(project_id.to_owned(), request.environment))
        else {
            return Err(BuildNotFoundError {
                project_id: project_id.to_owned(),
                environment: request.environment,
            }
            .into());
        };
        let Some(page) = build.pages.find(request.page_id_or_path) else {
            return Err(PageNotFoundError {
                build_id: build.id.clone(),
                page_id_or_path: request.page_id_or_path.to_owned(),
            }
            .into());
        };
        let Some(tree) = guard.trees.get(&page.tree_id) else {
            return Err(TreeNotFoundError {
                tree_id: page.tree_id.clone(),
                page_id: page.id.clone(),
            }
            .into());
        };
        let props = guard
            .props
            .get(&tree.id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let canvas = PageCanvas {
            build_id: &build.id,
            page,
            tree,
            props,
        };
        Ok(CanvasData::new(serde_json::to_value(canvas)?))
    }
}
