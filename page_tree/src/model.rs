use std::fmt::Formatter;

use crate::Environment;

/// The identifier of a project.
///
/// It is opaque: no format is enforced beyond being a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Project metadata, as returned by a [`ProjectStore`](crate::store::ProjectStore).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub domain: String,
}

/// An immutable snapshot of a project's page tree, for a given [`Environment`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: String,
    pub project_id: ProjectId,
    pub environment: Environment,
    pub pages: Pages,
}

/// The pages of a [`Build`]: exactly one home page, plus zero or more other pages.
///
/// The order of `pages` is meaningful and must be preserved by consumers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pages {
    pub home_page: Page,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Pages {
    /// Iterate over all pages, home page first.
    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        std::iter::once(&self.home_page).chain(self.pages.iter())
    }

    /// Find a page using either its id or its path.
    pub fn find(&self, page_id_or_path: &str) -> Option<&Page> {
        self.iter()
            .find(|page| page.id == page_id_or_path || page.path == page_id_or_path)
    }

    /// The total number of pages, home page included.
    pub fn len(&self) -> usize {
        1 + self.pages.len()
    }

    /// A build always has a home page.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    /// The locator used to request the page's canvas data.
    pub path: String,
    #[serde(default)]
    pub title: String,
    /// The instance tree rendered on this page.
    pub tree_id: String,
}

/// The payload required to render a single page.
///
/// The aggregator treats it as an opaque value: it is collected, never inspected.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CanvasData(serde_json::Value);

impl CanvasData {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for CanvasData {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// The canvas data of every page of a build.
///
/// The home page comes first, followed by all other pages in the order
/// declared by the build.
pub type PagesDetails = Vec<CanvasData>;
