//! A hierarchical configuration composer.
//!
//! Users describe their configuration as a primary document plus an ordered
//! *defaults list* naming further documents to merge in, and [`Composer`]
//! resolves that list against a multi-provider [`SearchPath`] — filesystem
//! directories and `pkg://`-scheme packaged resources — to produce a single
//! [`Document`]. Command-line overrides are then classified into group
//! rewrites (which alter the defaults list before composition), free
//! defaults additions, and residual leaf-value sets applied after the merge.
//!
//! # Quick start
//!
//! ```ignore
//! let composer = Composer::builder()
//!     .add_entry("user", Location::Filesystem("./conf".into()))
//!     .build();
//!
//! let composed = composer.load_configuration(Some("config"), &overrides, None)?;
//! ```

pub mod composer;
pub mod defaults;
pub mod document;
pub mod document_store;
pub mod error;
pub mod group_lister;
pub mod job_runtime;
pub mod override_classifier;
pub mod override_parser;
pub mod resolver;
pub mod search_path;

#[cfg(test)]
mod fixtures;

pub use composer::{Composed, Composer, ComposerBuilder};
pub use defaults::{DefaultsEntry, DefaultsList, GroupBinding};
pub use document::Document;
pub use document_store::{DocumentStore, LoadTrace, LoadTraceEntry};
pub use error::ComposerError;
pub use group_lister::{EntryKind, GroupLister};
pub use job_runtime::{DefaultJobRuntime, JobRuntime};
pub use override_classifier::{ClassifiedOverrides, classify};
pub use override_parser::{RawOverride, parse as parse_overrides};
pub use resolver::{PackageProbe, PackageSource, ResourceResolver};
pub use search_path::{Entry, Location, SearchPath};
