//! Orchestrates a full configuration load: the framework document, the
//! user's primary document, the merged defaults list, override
//! classification, the ordered merge, and the reserved `framework.*`
//! bookkeeping subtree. See [`Composer::load_configuration`] and
//! [`Composer::load_sweep_config`].

use serde_yaml::Value;

use crate::defaults::{DefaultsEntry, DefaultsList, SWEEP_SENTINEL};
use crate::document::Document;
use crate::document_store::{DocumentStore, LoadTrace, describe_location};
use crate::error::ComposerError;
use crate::group_lister::{EntryKind, GroupLister};
use crate::job_runtime::{DefaultJobRuntime, JobRuntime};
use crate::override_classifier::{self, ClassifiedOverrides};
use crate::override_parser::{self, RawOverride};
use crate::resolver::{PackageSource, ResourceResolver};
use crate::search_path::{Location, SearchPath};

const FRAMEWORK_DOC: &str = "framework.yaml";

#[derive(Debug)]
pub struct Composed {
    pub document: Document,
    pub trace: LoadTrace,
}

pub struct ComposerBuilder {
    search_path: SearchPath,
    strict: bool,
    job_runtime: Box<dyn JobRuntime>,
    package_source: Option<Box<dyn PackageSource>>,
    override_dirname_kv_sep: String,
    override_dirname_item_sep: String,
    override_dirname_exclude: Vec<String>,
}

impl ComposerBuilder {
    pub fn new() -> Self {
        Self {
            search_path: SearchPath::new(),
            strict: true,
            job_runtime: Box::new(DefaultJobRuntime),
            package_source: None,
            override_dirname_kv_sep: "=".to_string(),
            override_dirname_item_sep: ",".to_string(),
            override_dirname_exclude: Vec::new(),
        }
    }

    pub fn search_path(mut self, search_path: SearchPath) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn add_entry(mut self, provider: &str, location: Location) -> Self {
        self.search_path.push(provider, location);
        self
    }

    /// Default strictness when `load_configuration`'s own `strict` argument
    /// is `None`. The `framework.*` subtree is unconditionally strict
    /// regardless of this setting.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn job_runtime(mut self, runtime: Box<dyn JobRuntime>) -> Self {
        self.job_runtime = runtime;
        self
    }

    pub fn package_source(mut self, source: Box<dyn PackageSource>) -> Self {
        self.package_source = Some(source);
        self
    }

    pub fn override_dirname_separators(mut self, kv_sep: &str, item_sep: &str) -> Self {
        self.override_dirname_kv_sep = kv_sep.to_string();
        self.override_dirname_item_sep = item_sep.to_string();
        self
    }

    pub fn override_dirname_exclude(mut self, keys: Vec<String>) -> Self {
        self.override_dirname_exclude = keys;
        self
    }

    pub fn build(self) -> Composer {
        Composer {
            search_path: self.search_path,
            strict: self.strict,
            job_runtime: self.job_runtime,
            package_source: self.package_source,
            override_dirname_kv_sep: self.override_dirname_kv_sep,
            override_dirname_item_sep: self.override_dirname_item_sep,
            override_dirname_exclude: self.override_dirname_exclude,
        }
    }
}

impl Default for ComposerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Composer {
    search_path: SearchPath,
    strict: bool,
    job_runtime: Box<dyn JobRuntime>,
    package_source: Option<Box<dyn PackageSource>>,
    override_dirname_kv_sep: String,
    override_dirname_item_sep: String,
    override_dirname_exclude: Vec<String>,
}

impl Composer {
    pub fn builder() -> ComposerBuilder {
        ComposerBuilder::new()
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    fn resolver(&self) -> ResourceResolver<'_> {
        ResourceResolver::new(&self.search_path, self.package_source.as_deref())
    }

    fn group_lister(&self) -> GroupLister<'_> {
        GroupLister::new(&self.search_path, self.package_source.as_deref())
    }

    fn describe_search_path(&self) -> Vec<String> {
        self.search_path
            .entries()
            .iter()
            .map(|e| format!("{} ({})", describe_location(&e.location), e.provider))
            .collect()
    }

    /// Run the full composition described at the top of this module.
    pub fn load_configuration(
        &self,
        config_file: Option<&str>,
        overrides: &[String],
        strict: Option<bool>,
    ) -> Result<Composed, ComposerError> {
        let effective_strict = strict.unwrap_or(self.strict);
        let mut trace = LoadTrace::new();
        let store = DocumentStore::new(self.resolver());

        // Step 1: the primary config, if named, must exist somewhere.
        if let Some(name) = config_file {
            let normalized = normalize_name(name);
            if self.resolver().find(&normalized)?.is_none() {
                return Err(ComposerError::MissingPrimaryConfig {
                    name: normalized,
                    search_path: self.describe_search_path(),
                });
            }
        }

        // Step 2: the framework document is mandatory.
        let framework_doc = store
            .load(FRAMEWORK_DOC, true, &mut trace)?
            .ok_or_else(|| ComposerError::MissingPrimaryConfig {
                name: FRAMEWORK_DOC.to_string(),
                search_path: self.describe_search_path(),
            })?;

        // Step 3: load the user's primary document without a second trace entry.
        let job_doc = match config_file {
            Some(name) => store.load(&normalize_name(name), false, &mut trace)?,
            None => None,
        };

        // Step 4: framework-owned defaults.
        let mut defaults = DefaultsList::from_value(
            framework_doc.get_path("defaults").unwrap_or(&Value::Null),
        )?;

        // Step 5: append the primary config as a bare default; remember the boundary.
        if let Some(name) = config_file {
            defaults.push(DefaultsEntry::Bare(normalize_name(name)));
        }
        let split_at = defaults.len();

        // Step 6: merge in the user document's own defaults.
        if let Some(job) = &job_doc {
            let job_defaults = DefaultsList::from_value(
                job.get_path("defaults").unwrap_or(&Value::Null),
            )?;
            DefaultsList::merge(&mut defaults, &job_defaults);
        }

        // Step 7: classify overrides against the merged defaults list.
        let raw_overrides = override_parser::parse(overrides)?;
        let lister = self.group_lister();
        let available_groups = lister.list_groups("");
        let classified: ClassifiedOverrides = override_classifier::classify(
            &mut defaults,
            raw_overrides,
            |group| available_groups.iter().any(|g| g == group),
        );

        // Step 9: seed the reserved framework subtree, then merge documents
        // in two passes — framework defaults, then user defaults.
        let mut composed = Document::empty();
        composed.set_path("framework", framework_doc.value().clone(), false)?;
        for (idx, entry) in defaults.iter().enumerate() {
            let _pass = if idx < split_at { "framework" } else { "user" };
            self.merge_one(entry, &store, &mut trace, &mut composed)?;
        }

        // The defaults list is a composition directive, not user data — drop
        // it from the composed tree and from the seeded framework subtree.
        composed.remove_path("defaults");
        composed.remove_path("framework.defaults");

        // Step 10/11: apply residual overrides. `framework.*` is unconditionally strict.
        for ov in &classified.residual {
            let strict_for_key = effective_strict || is_framework_key(&ov.key);
            let value = parse_scalar(&ov.value);
            composed.set_path(&ov.key, value, strict_for_key)?;
        }

        // Step 12: framework bookkeeping.
        self.write_bookkeeping(&mut composed, config_file, &classified)?;

        composed.resolve_interpolations();

        Ok(Composed {
            document: composed,
            trace,
        })
    }

    fn merge_one(
        &self,
        entry: &DefaultsEntry,
        store: &DocumentStore<'_>,
        trace: &mut LoadTrace,
        composed: &mut Document,
    ) -> Result<(), ComposerError> {
        match entry {
            DefaultsEntry::Bare(name) => {
                let normalized = normalize_name(name);
                match store.load(&normalized, true, trace)? {
                    Some(doc) => composed.merge(&doc),
                    None => {
                        return Err(ComposerError::MissingPrimaryConfig {
                            name: normalized,
                            search_path: self.describe_search_path(),
                        });
                    }
                }
                Ok(())
            }
            DefaultsEntry::Group(binding) => {
                let choice = match &binding.choice {
                    None => return Ok(()),
                    Some(c) if c.contains(SWEEP_SENTINEL) => return Ok(()),
                    Some(c) => c,
                };
                let rel = format!("{}/{}", binding.group, normalize_name(choice));
                match store.load(&rel, true, trace)? {
                    Some(doc) => {
                        composed.merge(&doc);
                        Ok(())
                    }
                    None if binding.optional => Ok(()),
                    None => {
                        let options = self.group_lister().get_group_options(&binding.group, EntryKind::File);
                        Err(ComposerError::MissingConfig {
                            group: binding.group.clone(),
                            choice: choice.clone(),
                            options,
                        })
                    }
                }
            }
        }
    }

    fn write_bookkeeping(
        &self,
        composed: &mut Document,
        config_file: Option<&str>,
        classified: &ClassifiedOverrides,
    ) -> Result<(), ComposerError> {
        let mut framework_overrides = Vec::new();
        let mut task_overrides = Vec::new();
        let applied: Vec<RawOverride> = classified.applied().cloned().collect();

        for ov in &applied {
            let token = format!("{}={}", ov.key, ov.value);
            if is_framework_key(&ov.key) {
                framework_overrides.push(token);
            } else {
                task_overrides.push(token);
            }
        }

        let dirname_items: Vec<(String, String)> = applied
            .iter()
            .filter(|o| !is_framework_key(&o.key))
            .map(|o| (o.key.clone(), o.value.clone()))
            .collect();
        let override_dirname = compute_override_dirname(
            &dirname_items,
            &self.override_dirname_kv_sep,
            &self.override_dirname_item_sep,
            &self.override_dirname_exclude,
        );

        composed.set_path("framework.overrides.task", to_yaml_seq(&task_overrides), false)?;
        composed.set_path(
            "framework.overrides.framework",
            to_yaml_seq(&framework_overrides),
            false,
        )?;
        if composed.get_path("framework.job.name").is_none() {
            composed.set_path(
                "framework.job.name",
                Value::String(self.job_runtime.default_job_name()),
                false,
            )?;
        }
        composed.set_path(
            "framework.job.override_dirname",
            Value::String(override_dirname.clone()),
            false,
        )?;
        if let Some(name) = config_file {
            composed.set_path("framework.job.config_file", Value::String(name.to_string()), false)?;
        }
        tracing::debug!(
            task_overrides = task_overrides.len(),
            framework_overrides = framework_overrides.len(),
            override_dirname = %override_dirname,
            "wrote framework bookkeeping subtree"
        );
        Ok(())
    }

    /// Re-run `load_configuration` for a sweep child: start from the
    /// parent's framework-scoped overrides, append the sweep's own, then
    /// carry over the runtime subtree and the interpolation cache so
    /// reproducible values (like `${now}`) match across siblings.
    pub fn load_sweep_config(
        &self,
        master: &Composed,
        config_file: Option<&str>,
        sweep_overrides: &[String],
    ) -> Result<Composed, ComposerError> {
        let mut base_overrides: Vec<String> = master
            .document
            .get_path("framework.overrides.framework")
            .and_then(|v| v.as_sequence())
            .map(|seq| {
                seq.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        base_overrides.extend(sweep_overrides.iter().cloned());

        let mut result = self.load_configuration(config_file, &base_overrides, None)?;

        if let Some(runtime) = master.document.get_path("framework.runtime") {
            result
                .document
                .set_path("framework.runtime", runtime.clone(), false)?;
        }
        result.document.set_cache(master.document.cache());
        Ok(result)
    }
}

fn is_framework_key(key: &str) -> bool {
    key.starts_with("framework.") || key.starts_with("framework/")
}

fn normalize_name(name: &str) -> String {
    if name.ends_with(".yaml") || name.ends_with(".yml") {
        name.to_string()
    } else {
        format!("{name}.yaml")
    }
}

fn parse_scalar(s: &str) -> Value {
    if s == "null" {
        return Value::Null;
    }
    if let Ok(b) = s.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::from(f);
    }
    Value::String(s.to_string())
}

fn to_yaml_seq(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::String(s.clone())).collect())
}

/// Deterministic `override_dirname` formatting: sorted `key=value` pairs
/// joined by `item_sep`, with any excluded keys dropped first.
pub fn compute_override_dirname(
    overrides: &[(String, String)],
    kv_sep: &str,
    item_sep: &str,
    exclude: &[String],
) -> String {
    let mut items: Vec<String> = overrides
        .iter()
        .filter(|(k, _)| !exclude.contains(k))
        .map(|(k, v)| format!("{k}{kv_sep}{v}"))
        .collect();
    items.sort();
    items.join(item_sep)
}
