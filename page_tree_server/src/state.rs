use std::sync::Arc;

use anyhow::Context;
use page_tree::store::{InMemoryStore, Snapshot};
use page_tree::{PageTreeAggregator, TracingDiagnostics};

use crate::configuration::Config;

/// The state shared by all request handlers.
#[derive(Debug, Clone)]
pub struct ApplicationState {
    pub aggregator: Arc<PageTreeAggregator>,
}

impl ApplicationState {
    pub fn new(aggregator: PageTreeAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }

    /// Serve the content of `store`, reporting unexpected failures via `tracing`.
    pub fn from_store(store: InMemoryStore, config: &Config) -> Self {
        let aggregator = PageTreeAggregator::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(TracingDiagnostics),
        )
        .set_config(config.aggregation.clone());
        Self::new(aggregator)
    }
}

/// Build the application state according to the given configuration.
///
/// The store is populated from the snapshot at `store.snapshot_path`.
pub fn build_application_state(config: &Config) -> Result<ApplicationState, anyhow::Error> {
    let snapshot_path = config.store.snapshot_path();
    let snapshot = Snapshot::from_file(&snapshot_path)
        .context("Failed to load the initial content of the store")?;
    tracing::info!(
        n_projects = snapshot.projects.len(),
        n_builds = snapshot.builds.len(),
        path = %snapshot_path.display(),
        "Loaded store snapshot"
    );
    let store = InMemoryStore::from_snapshot(snapshot);
    Ok(ApplicationState::from_store(store, config))
}
