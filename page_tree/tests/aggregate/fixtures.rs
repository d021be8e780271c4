use std::sync::{Arc, Mutex as SyncMutex};
use std::time::Duration;

use page_tree::instance_tree::{Instance, InstanceChild, Tree};
use page_tree::store::errors::{LoadCanvasDataError, LoadError};
use page_tree::store::{
    BuildStore, CanvasDataLoader, CanvasDataRequest, InMemoryStore, ProjectParams, ProjectStore,
};
use page_tree::{
    Build, CanvasData, Diagnostics, Environment, Page, PageTreeAggregator, Pages, Project,
    ProjectId, RequestContext,
};
use tokio::sync::Mutex;

/// A project with a `prod` build, a home page at `/` and the given other pages.
pub struct ProjectFixture {
    pub project_id: String,
    pub other_paths: Vec<String>,
    /// If `false`, the `prod` build is not stored.
    pub published: bool,
    /// If `false`, the project record is not stored.
    pub with_project_record: bool,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self {
            project_id: "p1".into(),
            other_paths: vec!["/about".into()],
            published: true,
            with_project_record: true,
        }
    }
}

impl ProjectFixture {
    pub fn with_other_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.other_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub async fn setup(&self, store: &InMemoryStore) {
        if self.with_project_record {
            store
                .insert_project(Project {
                    id: self.project_id.as_str().into(),
                    title: "My site".into(),
                    domain: "my-site".into(),
                })
                .await;
        }
        if !self.published {
            return;
        }
        let home_page = page("/");
        let pages: Vec<Page> = self.other_paths.iter().map(|path| page(path)).collect();
        for page in std::iter::once(&home_page).chain(&pages) {
            store.insert_tree(tree_for(page)).await;
        }
        store
            .insert_build(Build {
                id: format!("{}-prod", self.project_id),
                project_id: self.project_id.as_str().into(),
                environment: Environment::Prod,
                pages: Pages { home_page, pages },
            })
            .await;
    }
}

fn page(path: &str) -> Page {
    let slug = slug(path);
    Page {
        id: format!("page-{slug}"),
        name: slug.clone(),
        path: path.into(),
        title: slug.clone(),
        tree_id: format!("tree-{slug}"),
    }
}

fn slug(path: &str) -> String {
    match path.trim_start_matches('/') {
        "" => "home".into(),
        s => s.replace('/', "-"),
    }
}

fn tree_for(page: &Page) -> Tree {
    Tree {
        id: page.tree_id.clone(),
        root: Instance {
            id: format!("root-{}", page.id),
            component: "Body".into(),
            label: None,
            children: vec![InstanceChild::Text {
                value: page.path.clone(),
            }],
        },
    }
}

/// The path of the page a [`CanvasData`] was assembled for.
pub fn page_path(canvas: &CanvasData) -> &str {
    canvas.as_value()["page"]["path"]
        .as_str()
        .expect("Canvas data without a page path")
}

/// Build an aggregator on top of the given collaborators.
pub fn aggregator<S>(store: S, diagnostics: RecordingDiagnostics) -> PageTreeAggregator
where
    S: BuildStore + ProjectStore + CanvasDataLoader + Clone + 'static,
{
    PageTreeAggregator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(diagnostics),
    )
}

pub fn context() -> RequestContext {
    RequestContext::create(Environment::Prod)
}

/// A store that wraps [`InMemoryStore`], recording every call and
/// optionally injecting failures or latency into canvas data loads.
#[derive(Clone, Debug)]
pub struct SpyStore {
    inner: InMemoryStore,
    tracker: CallTracker,
    failing_path: Option<String>,
    failing_build_loads: bool,
    failing_project_loads: bool,
    latencies: Arc<Vec<(String, Duration)>>,
}

impl SpyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            tracker: CallTracker::default(),
            failing_path: None,
            failing_build_loads: false,
            failing_project_loads: false,
            latencies: Arc::new(Vec::new()),
        }
    }

    pub fn call_tracker(&self) -> CallTracker {
        self.tracker.clone()
    }

    /// Loading the canvas data for `path` will fail.
    pub fn fail_on(mut self, path: &str) -> Self {
        self.failing_path = Some(path.to_owned());
        self
    }

    /// Loading any build will fail.
    pub fn fail_build_loads(mut self) -> Self {
        self.failing_build_loads = true;
        self
    }

    /// Loading any project will fail.
    pub fn fail_project_loads(mut self) -> Self {
        self.failing_project_loads = true;
        self
    }

    /// Loading the canvas data for each path will take the associated time.
    pub fn with_latencies<I>(mut self, latencies: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Duration)>,
    {
        self.latencies = Arc::new(
            latencies
                .into_iter()
                .map(|(path, delay)| (path.to_owned(), delay))
                .collect(),
        );
        self
    }
}

#[async_trait::async_trait]
impl BuildStore for SpyStore {
    async fn load_by_project_id(
        &self,
        project_id: &ProjectId,
        environment: Environment,
    ) -> Result<Option<Build>, LoadError> {
        self.tracker
            .push(format!("load-build {project_id} {environment}"))
            .await;
        if self.failing_build_loads {
            return Err(LoadError::Other(anyhow::anyhow!("Build storage is unavailable")));
        }
        self.inner.load_by_project_id(project_id, environment).await
    }
}

#[async_trait::async_trait]
impl ProjectStore for SpyStore {
    async fn load_by_params(
        &self,
        params: &ProjectParams,
        context: &RequestContext,
    ) -> Result<Option<Project>, LoadError> {
        self.tracker
            .push(format!("load-project {}", params.project_id))
            .await;
        if self.failing_project_loads {
            return Err(LoadError::Other(anyhow::anyhow!("Project storage is unavailable")));
        }
        self.inner.load_by_params(params, context).await
    }
}

#[async_trait::async_trait]
impl CanvasDataLoader for SpyStore {
    async fn load(
        &self,
        request: CanvasDataRequest<'_>,
        context: &RequestContext,
    ) -> Result<CanvasData, LoadCanvasDataError> {
        self.tracker
            .push(format!(
                "load-canvas {} {}",
                request.environment, request.page_id_or_path
            ))
            .await;
        if let Some((_, delay)) = self
            .latencies
            .iter()
            .find(|(path, _)| path == request.page_id_or_path)
        {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_path.as_deref() == Some(request.page_id_or_path) {
            return Err(LoadError::Other(anyhow::anyhow!("Canvas storage is unavailable")).into());
        }
        self.inner.load(request, context).await
    }
}

#[derive(Clone, Debug, Default)]
pub struct CallTracker {
    operation_log: Arc<Mutex<Vec<String>>>,
}

impl CallTracker {
    async fn push(&self, operation: String) {
        self.operation_log.lock().await.push(operation);
    }

    pub async fn operation_log(&self) -> Vec<String> {
        self.operation_log.lock().await.clone()
    }

    pub async fn assert_store_was_untouched(&self) {
        let oplog = self.operation_log().await;
        assert!(oplog.is_empty(), "Operation log: {oplog:?}");
    }

    pub async fn assert_project_was_never_loaded(&self) {
        let oplog = self.operation_log().await;
        assert!(
            oplog.iter().all(|op| !op.starts_with("load-project")),
            "Operation log: {oplog:?}"
        );
    }
}

/// A [`Diagnostics`] sink that keeps the message of every reported error.
#[derive(Clone, Default)]
pub struct RecordingDiagnostics(Arc<SyncMutex<Vec<String>>>);

impl RecordingDiagnostics {
    pub fn reports(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, error: &(dyn std::error::Error + 'static)) {
        self.0.lock().unwrap().push(error.to_string());
    }
}
