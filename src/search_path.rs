//! The ordered list of places a document may come from: filesystem directories
//! or `pkg://`-scheme packaged resources. See [`crate::resolver`] for how an
//! [`Entry`] is actually probed.

use std::path::PathBuf;

/// Where a search-path entry's documents physically live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Filesystem(PathBuf),
    /// A packaged-resource root, already split at the first `/` after the
    /// `pkg://` prefix into the module qualifier and the resource sub-path.
    Package { module: String, subpath: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub provider: String,
    pub location: Location,
}

/// Ordered, insertion-significant list of search-path entries. First hit wins.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    entries: Vec<Entry>,
}

impl SearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, provider: impl Into<String>, location: Location) -> &mut Self {
        self.entries.push(Entry {
            provider: provider.into(),
            location,
        });
        self
    }

    pub fn push_spec(&mut self, provider: impl Into<String>, spec: &str) -> &mut Self {
        self.push(provider, parse_location(spec));
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

/// Parse a search-path spec string: `pkg://module.qualifier/sub/path` is a
/// packaged resource, split on the first `/` after the scheme; anything else
/// is a plain filesystem directory.
pub fn parse_location(spec: &str) -> Location {
    match spec.strip_prefix("pkg://") {
        Some(rest) => match rest.split_once('/') {
            Some((module, subpath)) => Location::Package {
                module: module.to_string(),
                subpath: subpath.to_string(),
            },
            None => Location::Package {
                module: rest.to_string(),
                subpath: String::new(),
            },
        },
        None => Location::Filesystem(PathBuf::from(spec)),
    }
}
