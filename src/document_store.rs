//! Reads located documents into [`Document`] trees and records a
//! [`LoadTrace`] of every probe, hit or miss.

use serde_yaml::Value;

use crate::document::Document;
use crate::error::ComposerError;
use crate::resolver::{ResourceResolver, join_resource};
use crate::search_path::{Entry, Location};

/// One resolver probe. `location` is `None` when the document was searched
/// for but not found anywhere on the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTraceEntry {
    pub filename: String,
    pub location: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadTrace(Vec<LoadTraceEntry>);

impl LoadTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self, filename: &str, entry: &Entry) {
        self.0.push(LoadTraceEntry {
            filename: filename.to_string(),
            location: Some(describe_location(&entry.location)),
            provider: Some(entry.provider.clone()),
        });
    }

    pub fn record_miss(&mut self, filename: &str) {
        self.0.push(LoadTraceEntry {
            filename: filename.to_string(),
            location: None,
            provider: None,
        });
    }

    pub fn entries(&self) -> &[LoadTraceEntry] {
        &self.0
    }
}

pub fn describe_location(location: &Location) -> String {
    match location {
        Location::Filesystem(dir) => dir.display().to_string(),
        Location::Package { module, subpath } => {
            if subpath.is_empty() {
                format!("pkg://{module}")
            } else {
                format!("pkg://{module}/{subpath}")
            }
        }
    }
}

pub struct DocumentStore<'a> {
    resolver: ResourceResolver<'a>,
}

impl<'a> DocumentStore<'a> {
    pub fn new(resolver: ResourceResolver<'a>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ResourceResolver<'a> {
        &self.resolver
    }

    /// Load `name`, optionally recording the probe in `trace`. Returns `Ok(None)`
    /// on a clean miss. The document root must be a mapping.
    pub fn load(
        &self,
        name: &str,
        record: bool,
        trace: &mut LoadTrace,
    ) -> Result<Option<Document>, ComposerError> {
        let Some(entry) = self.resolver.find(name)? else {
            tracing::debug!(name, "document miss across search path");
            if record {
                trace.record_miss(name);
            }
            return Ok(None);
        };

        tracing::debug!(name, provider = %entry.provider, "document hit");
        let raw = self.read_raw(name, entry)?;
        let value: Value = serde_yaml::from_str(&raw).map_err(|source| ComposerError::Parse {
            path: name.to_string(),
            source,
        })?;
        if !matches!(value, Value::Mapping(_)) {
            return Err(ComposerError::InvalidDocumentRoot {
                path: name.to_string(),
            });
        }
        if record {
            trace.record_hit(name, entry);
        }
        Ok(Some(Document::new(value)))
    }

    fn read_raw(&self, name: &str, entry: &Entry) -> Result<String, ComposerError> {
        match &entry.location {
            Location::Filesystem(dir) => {
                let path = dir.join(name);
                std::fs::read_to_string(&path).map_err(|source| ComposerError::Io { path, source })
            }
            Location::Package { module, subpath } => {
                let resource = join_resource(subpath, name);
                let source = self.resolver.package_source().ok_or_else(|| {
                    ComposerError::PackageNotImportable {
                        module: module.clone(),
                    }
                })?;
                source.read(module, &resource)
            }
        }
    }
}
