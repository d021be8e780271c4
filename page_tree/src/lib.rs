//! # `page_tree`
//!
//! Assemble the canvas data of every page of a published project.
//!
//! The entrypoint is [`PageTreeAggregator`]: given a project id, it resolves the
//! project's `prod` build, then asks a [`CanvasDataLoader`] for the canvas data of
//! the home page and of every other page, in the order declared by the build.
//!
//! Everything the aggregator reads comes from collaborators it doesn't own:
//!
//! - [`BuildStore`], to resolve the build of a project for a given [`Environment`]
//! - [`ProjectStore`], to resolve the project metadata
//! - [`CanvasDataLoader`], to assemble the canvas data for a single page
//! - [`Diagnostics`], to report failures nobody anticipated
//!
//! [`InMemoryStore`] implements all three store traits and can be populated
//! from a JSON [`Snapshot`] on disk.
//!
//! [`BuildStore`]: store::BuildStore
//! [`ProjectStore`]: store::ProjectStore
//! [`CanvasDataLoader`]: store::CanvasDataLoader
//! [`InMemoryStore`]: store::InMemoryStore
//! [`Snapshot`]: store::Snapshot
pub use aggregate::{AggregationError, AggregatorConfig, PageTreeAggregator};
pub use context::{RequestContext, RequestId};
pub use diagnostics::{Diagnostics, TracingDiagnostics};
pub use environment::Environment;
pub use model::{Build, CanvasData, Page, Pages, PagesDetails, Project, ProjectId};

mod aggregate;
mod context;
mod diagnostics;
mod environment;
pub mod instance_tree;
mod model;
pub mod store;
