//! Enumerates groups and group options across the search path. Both the
//! filesystem and package branches join a search-path location with the
//! group/parent name exactly once — the original implementation this crate
//! is descended from double-joined in the filesystem branch for some call
//! sites; that was a bug, not a layering mechanism, and is not reproduced here.

use std::collections::BTreeSet;

use crate::resolver::{PackageSource, join_resource};
use crate::search_path::{Entry, Location, SearchPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
}

pub struct GroupLister<'a> {
    search_path: &'a SearchPath,
    package_source: Option<&'a dyn PackageSource>,
}

impl<'a> GroupLister<'a> {
    pub fn new(search_path: &'a SearchPath, package_source: Option<&'a dyn PackageSource>) -> Self {
        Self {
            search_path,
            package_source,
        }
    }

    /// Union of sub-directory names under `parent` across all search-path
    /// entries, e.g. the set of available groups.
    pub fn list_groups(&self, parent: &str) -> Vec<String> {
        let mut out = BTreeSet::new();
        for entry in self.search_path.entries() {
            out.extend(self.list_kind(entry, parent, EntryKind::Dir));
        }
        out.into_iter().collect()
    }

    /// Union of document (or sub-directory) names available under `group`.
    pub fn get_group_options(&self, group: &str, kind: EntryKind) -> Vec<String> {
        let mut out = BTreeSet::new();
        for entry in self.search_path.entries() {
            out.extend(self.list_kind(entry, group, kind));
        }
        out.into_iter().collect()
    }

    fn list_kind(&self, entry: &Entry, name: &str, kind: EntryKind) -> Vec<String> {
        match &entry.location {
            Location::Filesystem(dir) => {
                let target = dir.join(name);
                let Ok(read_dir) = std::fs::read_dir(&target) else {
                    return Vec::new();
                };
                read_dir
                    .filter_map(|e| e.ok())
                    .filter_map(|e| filter_fs_entry(&e, kind))
                    .collect()
            }
            Location::Package { module, subpath } => {
                let Some(source) = self.package_source else {
                    return Vec::new();
                };
                let resource = join_resource(subpath, name);
                source
                    .list_dir(module, &resource)
                    .into_iter()
                    .filter_map(|n| filter_package_entry(&n, kind))
                    .collect()
            }
        }
    }
}

fn filter_fs_entry(entry: &std::fs::DirEntry, kind: EntryKind) -> Option<String> {
    let file_type = entry.file_type().ok()?;
    let name = entry.file_name().to_string_lossy().to_string();
    if name.starts_with('.') || name == "__pycache__" {
        return None;
    }
    match kind {
        EntryKind::Dir => file_type.is_dir().then_some(name),
        EntryKind::File => {
            if !file_type.is_file() {
                return None;
            }
            strip_yaml_extension(&name)
        }
    }
}

fn filter_package_entry(name: &str, kind: EntryKind) -> Option<String> {
    if name.starts_with('.') || name == "__pycache__" {
        return None;
    }
    match kind {
        EntryKind::Dir => {
            if name.ends_with(".yaml") || name.ends_with(".yml") {
                None
            } else {
                Some(name.to_string())
            }
        }
        EntryKind::File => strip_yaml_extension(name),
    }
}

fn strip_yaml_extension(name: &str) -> Option<String> {
    name.strip_suffix(".yaml")
        .or_else(|| name.strip_suffix(".yml"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn list_groups_finds_subdirectories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("model")).unwrap();
        fs::create_dir(dir.path().join("launcher")).unwrap();
        fs::write(dir.path().join("config.yaml"), "x: 1").unwrap();

        let mut sp = SearchPath::new();
        sp.push("user", Location::Filesystem(dir.path().to_path_buf()));
        let lister = GroupLister::new(&sp, None);

        let mut groups = lister.list_groups("");
        groups.sort();
        assert_eq!(groups, vec!["launcher".to_string(), "model".to_string()]);
    }

    #[test]
    fn get_group_options_strips_extension() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("model")).unwrap();
        fs::write(dir.path().join("model/a.yaml"), "x: 1").unwrap();
        fs::write(dir.path().join("model/b.yml"), "x: 2").unwrap();

        let mut sp = SearchPath::new();
        sp.push("user", Location::Filesystem(dir.path().to_path_buf()));
        let lister = GroupLister::new(&sp, None);

        let mut options = lister.get_group_options("model", EntryKind::File);
        options.sort();
        assert_eq!(options, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn single_join_not_double() {
        // A layout where model/model/ would only exist under the double-join bug.
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("model")).unwrap();
        fs::write(dir.path().join("model/a.yaml"), "x: 1").unwrap();

        let mut sp = SearchPath::new();
        sp.push("user", Location::Filesystem(dir.path().to_path_buf()));
        let lister = GroupLister::new(&sp, None);

        let options = lister.get_group_options("model", EntryKind::File);
        assert_eq!(options, vec!["a".to_string()]);
    }

    #[test]
    fn missing_group_dir_returns_empty() {
        let dir = TempDir::new().unwrap();
        let mut sp = SearchPath::new();
        sp.push("user", Location::Filesystem(dir.path().to_path_buf()));
        let lister = GroupLister::new(&sp, None);
        assert!(lister.get_group_options("nonexistent", EntryKind::File).is_empty());
    }

    #[test]
    fn union_across_providers_dedupes() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::create_dir(dir1.path().join("model")).unwrap();
        fs::create_dir(dir2.path().join("model")).unwrap();
        fs::write(dir1.path().join("model/a.yaml"), "x: 1").unwrap();
        fs::write(dir2.path().join("model/a.yaml"), "x: 2").unwrap();
        fs::write(dir2.path().join("model/b.yaml"), "x: 3").unwrap();

        let mut sp = SearchPath::new();
        sp.push("base", Location::Filesystem(dir1.path().to_path_buf()));
        sp.push("user", Location::Filesystem(dir2.path().to_path_buf()));
        let lister = GroupLister::new(&sp, None);

        let mut options = lister.get_group_options("model", EntryKind::File);
        options.sort();
        assert_eq!(options, vec!["a".to_string(), "b".to_string()]);
    }
}
