use std::path::Path;

use anyhow::Context;

use crate::instance_tree::{InstanceProps, Tree};
use crate::{Build, Project};

/// A serialized catalogue of projects, builds and instance trees.
///
/// Use [`InMemoryStore::from_snapshot`](super::InMemoryStore::from_snapshot) to
/// serve its content.
///
/// # Format
///
/// ```json
/// {
///   "projects": [{ "id": "p1", "title": "My site", "domain": "my-site" }],
///   "builds": [{
///     "id": "b1",
///     "projectId": "p1",
///     "environment": "prod",
///     "pages": {
///       "homePage": { "id": "home", "name": "Home", "path": "/", "treeId": "t1" },
///       "pages": []
///     }
///   }],
///   "trees": [{ "id": "t1", "root": { "id": "root", "component": "Body" } }],
///   "props": []
/// }
/// ```
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub builds: Vec<Build>,
    #[serde(default)]
    pub trees: Vec<Tree>,
    #[serde(default)]
    pub props: Vec<InstanceProps>,
}

impl Snapshot {
    /// Read and parse a snapshot file.
    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let raw = fs_err::read_to_string(path).context("Failed to read the snapshot file")?;
        let snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse the snapshot at {}", path.display()))?;
        Ok(snapshot)
    }
}
