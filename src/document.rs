//! The composed configuration tree: a YAML-backed document with deep merge,
//! dotted-path access under an optional strict-mode contract, and a small
//! interpolation cache that is transplanted across sweep siblings so that
//! resolved values (like `${now}`) stay reproducible.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_yaml::Value;

use crate::error::ComposerError;

/// Memoized resolutions for interpolation expressions, shared by clone so a
/// sweep child can inherit its parent's already-resolved values.
#[derive(Debug, Clone, Default)]
pub struct InterpolationCache(Rc<RefCell<HashMap<String, String>>>);

impl InterpolationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve_now(&self) -> String {
        self.0
            .borrow_mut()
            .entry("now".to_string())
            .or_insert_with(now_string)
            .clone()
    }
}

fn now_string() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

/// A structured configuration tree: maps, sequences, and scalars.
#[derive(Debug, Clone)]
pub struct Document {
    value: Value,
    cache: InterpolationCache,
}

impl Document {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            cache: InterpolationCache::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Value::Mapping(Default::default()))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn cache(&self) -> InterpolationCache {
        self.cache.clone()
    }

    pub fn set_cache(&mut self, cache: InterpolationCache) {
        self.cache = cache;
    }

    /// Right-biased deep merge: `overlay`'s scalars and lists replace `self`'s;
    /// mappings recurse key by key.
    pub fn merge(&mut self, overlay: &Document) {
        let base = std::mem::replace(&mut self.value, Value::Null);
        self.value = deep_merge(base, overlay.value.clone());
    }

    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut cur = &self.value;
        for segment in path.split('.') {
            cur = cur.as_mapping()?.get(Value::String(segment.to_string()))?;
        }
        Some(cur)
    }

    /// Set a dotted-path value. When `strict` is true, every segment along the
    /// path (including the leaf) must already exist; writing a wholly new key
    /// is a [`ComposerError::StrictViolation`]. When false, missing
    /// intermediate maps and leaves are created.
    pub fn set_path(&mut self, path: &str, new_value: Value, strict: bool) -> Result<(), ComposerError> {
        let segments: Vec<&str> = path.split('.').collect();
        set_path_recursive(&mut self.value, &segments, new_value, strict, path)
    }

    /// Remove a dotted-path key if present. A no-op when any segment along
    /// the path (including the leaf) doesn't exist.
    pub fn remove_path(&mut self, path: &str) {
        let segments: Vec<&str> = path.split('.').collect();
        remove_path_recursive(&mut self.value, &segments);
    }

    /// Resolve `${dotted.path}` and `${now}` references against this
    /// document's own tree, memoizing in the interpolation cache.
    pub fn resolve_interpolations(&mut self) {
        let root_snapshot = self.value.clone();
        resolve_node(&mut self.value, &root_snapshot, &self.cache);
    }
}

pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (_, overlay_val) => overlay_val,
    }
}

fn set_path_recursive(
    value: &mut Value,
    segments: &[&str],
    new_value: Value,
    strict: bool,
    full_path: &str,
) -> Result<(), ComposerError> {
    if !value.is_mapping() {
        *value = Value::Mapping(Default::default());
    }
    let map = value.as_mapping_mut().expect("just coerced to mapping");
    let key = Value::String(segments[0].to_string());

    if segments.len() == 1 {
        if strict && !map.contains_key(&key) {
            return Err(ComposerError::StrictViolation {
                key: full_path.to_string(),
            });
        }
        map.insert(key, new_value);
        return Ok(());
    }

    if strict && !map.contains_key(&key) {
        return Err(ComposerError::StrictViolation {
            key: full_path.to_string(),
        });
    }
    let entry = map
        .entry(key)
        .or_insert_with(|| Value::Mapping(Default::default()));
    set_path_recursive(entry, &segments[1..], new_value, strict, full_path)
}

fn remove_path_recursive(value: &mut Value, segments: &[&str]) {
    let Some(map) = value.as_mapping_mut() else {
        return;
    };
    if segments.len() == 1 {
        map.remove(Value::String(segments[0].to_string()));
        return;
    }
    if let Some(entry) = map.get_mut(Value::String(segments[0].to_string())) {
        remove_path_recursive(entry, &segments[1..]);
    }
}

fn resolve_node(node: &mut Value, root: &Value, cache: &InterpolationCache) {
    match node {
        Value::String(s) => {
            if let Some(resolved) = resolve_string(s, root, cache) {
                *s = resolved;
            }
        }
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                resolve_node(v, root, cache);
            }
        }
        Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                resolve_node(v, root, cache);
            }
        }
        _ => {}
    }
}

fn resolve_string(s: &str, root: &Value, cache: &InterpolationCache) -> Option<String> {
    let expr = s.strip_prefix("${")?.strip_suffix('}')?;
    if expr == "now" {
        return Some(cache.resolve_now());
    }
    let mut cur = root;
    for segment in expr.split('.') {
        cur = cur.as_mapping()?.get(Value::String(segment.to_string()))?;
    }
    Some(scalar_to_string(cur))
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}
