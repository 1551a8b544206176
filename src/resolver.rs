//! Probes a [`SearchPath`] in order for a named document, abstracting over
//! whether an entry lives on disk or inside a packaged resource.

use crate::error::ComposerError;
use crate::search_path::{Entry, Location, SearchPath};

/// Stands in for a package-resource API (there is no direct Rust analogue to
/// Python's `pkg_resources`): existence probing, reads, and directory
/// listing, all scoped to a module qualifier.
pub trait PackageSource: std::fmt::Debug {
    fn probe(&self, module: &str, resource: &str) -> PackageProbe;
    fn read(&self, module: &str, resource: &str) -> Result<String, ComposerError>;
    fn list_dir(&self, module: &str, resource: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageProbe {
    Found,
    Missing,
    /// The module exists but lacks whatever marks it as a proper resource
    /// root (e.g. an `__init__`-equivalent manifest); distinct from a clean
    /// miss so the caller can report a more specific error.
    NotImportable,
}

pub struct ResourceResolver<'a> {
    search_path: &'a SearchPath,
    package_source: Option<&'a dyn PackageSource>,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(search_path: &'a SearchPath, package_source: Option<&'a dyn PackageSource>) -> Self {
        Self {
            search_path,
            package_source,
        }
    }

    pub fn package_source(&self) -> Option<&'a dyn PackageSource> {
        self.package_source
    }

    /// Find the first search-path entry carrying `name`, in order.
    pub fn find(&self, name: &str) -> Result<Option<&'a Entry>, ComposerError> {
        for entry in self.search_path.entries() {
            match &entry.location {
                Location::Filesystem(dir) => {
                    let candidate = dir.join(name);
                    tracing::trace!(path = %candidate.display(), "probing filesystem");
                    if candidate.is_file() {
                        return Ok(Some(entry));
                    }
                }
                Location::Package { module, subpath } => {
                    let resource = join_resource(subpath, name);
                    tracing::trace!(module = %module, resource = %resource, "probing package");
                    let Some(source) = self.package_source else {
                        tracing::trace!(module = %module, "no package source configured, treating as miss");
                        continue;
                    };
                    match source.probe(module, &resource) {
                        PackageProbe::Found => return Ok(Some(entry)),
                        PackageProbe::Missing => continue,
                        PackageProbe::NotImportable => {
                            return Err(ComposerError::PackageNotImportable { module: module.clone() });
                        }
                    }
                }
            }
        }
        Ok(None)
    }
}

pub fn join_resource(subpath: &str, name: &str) -> String {
    if subpath.is_empty() {
        name.to_string()
    } else {
        format!("{subpath}/{name}")
    }
}
