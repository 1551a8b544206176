#[cfg(test)]
pub mod test {
    use std::collections::HashMap;

    use crate::error::ComposerError;
    use crate::resolver::{PackageProbe, PackageSource};

    /// An in-memory package-resource root keyed by `module/resource`, for
    /// tests that exercise the `pkg://` branch without touching the
    /// filesystem.
    #[derive(Debug, Default)]
    pub struct InMemoryPackageSource {
        files: HashMap<(String, String), String>,
        importable_modules: std::collections::HashSet<String>,
    }

    impl InMemoryPackageSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(mut self, module: &str, resource: &str, content: &str) -> Self {
            self.importable_modules.insert(module.to_string());
            self.files
                .insert((module.to_string(), resource.to_string()), content.to_string());
            self
        }

        pub fn mark_not_importable(mut self, module: &str) -> Self {
            self.importable_modules.remove(module);
            self.files.retain(|(m, _), _| m != module);
            self
        }
    }

    impl PackageSource for InMemoryPackageSource {
        fn probe(&self, module: &str, resource: &str) -> PackageProbe {
            if self.files.contains_key(&(module.to_string(), resource.to_string())) {
                PackageProbe::Found
            } else if self.importable_modules.contains(module) {
                PackageProbe::Missing
            } else {
                PackageProbe::NotImportable
            }
        }

        fn read(&self, module: &str, resource: &str) -> Result<String, ComposerError> {
            self.files
                .get(&(module.to_string(), resource.to_string()))
                .cloned()
                .ok_or_else(|| ComposerError::PackageNotImportable {
                    module: module.to_string(),
                })
        }

        fn list_dir(&self, module: &str, resource: &str) -> Vec<String> {
            let prefix = if resource.is_empty() {
                String::new()
            } else {
                format!("{resource}/")
            };
            self.files
                .keys()
                .filter(|(m, _)| m == module)
                .filter_map(|(_, path)| path.strip_prefix(&prefix))
                .filter(|rest| !rest.is_empty())
                .map(|rest| rest.split('/').next().unwrap().to_string())
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect()
        }
    }

    #[test]
    fn in_memory_source_round_trips() {
        let source = InMemoryPackageSource::new().with_file("pkg.confs", "model/a.yaml", "lr: 0.1");
        assert_eq!(source.probe("pkg.confs", "model/a.yaml"), PackageProbe::Found);
        assert_eq!(source.read("pkg.confs", "model/a.yaml").unwrap(), "lr: 0.1");
    }

    #[test]
    fn in_memory_source_missing_is_distinct_from_not_importable() {
        let source = InMemoryPackageSource::new().with_file("pkg.confs", "model/a.yaml", "lr: 0.1");
        assert_eq!(source.probe("pkg.confs", "model/b.yaml"), PackageProbe::Missing);
        assert_eq!(source.probe("other.confs", "x.yaml"), PackageProbe::NotImportable);
    }

    #[test]
    fn in_memory_source_lists_directory() {
        let source = InMemoryPackageSource::new()
            .with_file("pkg.confs", "model/a.yaml", "lr: 0.1")
            .with_file("pkg.confs", "model/b.yaml", "lr: 0.2");
        let mut names = source.list_dir("pkg.confs", "model");
        names.sort();
        assert_eq!(names, vec!["a.yaml".to_string(), "b.yaml".to_string()]);
    }
}
