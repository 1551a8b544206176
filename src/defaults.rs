//! The ordered defaults list that drives composition: plain document
//! references plus group bindings that select one document out of a named
//! alternatives directory.

use serde_yaml::Value;

use crate::error::ComposerError;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupBinding {
    pub group: String,
    /// `None` drops the group; `Some("_SKIP_")` defers it to a sweep child.
    pub choice: Option<String>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultsEntry {
    Bare(String),
    Group(GroupBinding),
}

pub const SWEEP_SENTINEL: &str = "_SKIP_";

#[derive(Debug, Clone, Default)]
pub struct DefaultsList(Vec<DefaultsEntry>);

impl DefaultsList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a defaults list out of a YAML value. `Null` (an absent `defaults:`
    /// key) is treated as an empty list.
    pub fn from_value(value: &Value) -> Result<Self, ComposerError> {
        let seq = match value {
            Value::Sequence(seq) => seq,
            Value::Null => return Ok(Self::default()),
            _ => {
                return Err(ComposerError::InvalidDefaults {
                    reason: "defaults must be a list".to_string(),
                });
            }
        };

        let mut out = Vec::with_capacity(seq.len());
        for item in seq {
            out.push(parse_entry(item)?);
        }
        Ok(Self(out))
    }

    pub fn push(&mut self, entry: DefaultsEntry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefaultsEntry> {
        self.0.iter()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.0
            .iter()
            .any(|e| matches!(e, DefaultsEntry::Group(b) if b.group == group))
    }

    pub fn group_mut(&mut self, group: &str) -> Option<&mut GroupBinding> {
        self.0.iter_mut().find_map(|e| match e {
            DefaultsEntry::Group(b) if b.group == group => Some(b),
            _ => None,
        })
    }

    pub fn remove_group(&mut self, group: &str) {
        self.0
            .retain(|e| !matches!(e, DefaultsEntry::Group(b) if b.group == group));
    }

    /// Merge `secondary` into `primary`: a group already present in `primary`
    /// has its choice replaced in place; anything else is appended.
    pub fn merge(primary: &mut DefaultsList, secondary: &DefaultsList) {
        for entry in secondary.0.iter() {
            match entry {
                DefaultsEntry::Group(incoming) => {
                    if let Some(existing) = primary.group_mut(&incoming.group) {
                        existing.choice = incoming.choice.clone();
                        existing.optional = incoming.optional;
                    } else {
                        primary.0.push(entry.clone());
                    }
                }
                DefaultsEntry::Bare(_) => primary.0.push(entry.clone()),
            }
        }
    }
}

fn parse_entry(item: &Value) -> Result<DefaultsEntry, ComposerError> {
    match item {
        Value::String(s) => Ok(DefaultsEntry::Bare(s.clone())),
        Value::Mapping(map) => {
            let mut group = None;
            let mut choice = None;
            let mut optional = false;

            for (k, v) in map {
                let key = k.as_str().ok_or_else(|| ComposerError::InvalidDefaults {
                    reason: "defaults map key must be a string".to_string(),
                })?;
                if key == "optional" {
                    optional = v.as_bool().ok_or_else(|| ComposerError::InvalidDefaults {
                        reason: "optional must be a bool".to_string(),
                    })?;
                    continue;
                }
                if group.is_some() {
                    return Err(ComposerError::InvalidDefaults {
                        reason: format!("defaults entry has more than one group key ('{key}' alongside an earlier one)"),
                    });
                }
                group = Some(key.to_string());
                choice = match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    _ => {
                        return Err(ComposerError::InvalidDefaults {
                            reason: format!("defaults choice for '{key}' must be a string or null"),
                        });
                    }
                };
            }

            let group = group.ok_or_else(|| ComposerError::InvalidDefaults {
                reason: "defaults entry is missing a group key".to_string(),
            })?;
            Ok(DefaultsEntry::Group(GroupBinding {
                group,
                choice,
                optional,
            }))
        }
        _ => Err(ComposerError::InvalidDefaults {
            reason: "defaults entry must be a string or a mapping".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn parses_bare_and_group_entries() {
        let list = DefaultsList::from_value(&value("[config, {model: a}, {launcher: local, optional: true}]")).unwrap();
        assert_eq!(list.len(), 3);
        assert!(matches!(&list.iter().next().unwrap(), DefaultsEntry::Bare(s) if s == "config"));
        assert!(list.has_group("model"));
        let launcher = list.iter().nth(2).unwrap();
        if let DefaultsEntry::Group(b) = launcher {
            assert_eq!(b.group, "launcher");
            assert!(b.optional);
        } else {
            panic!("expected group entry");
        }
    }

    #[test]
    fn absent_defaults_is_empty() {
        let list = DefaultsList::from_value(&Value::Null).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn rejects_non_list() {
        let err = DefaultsList::from_value(&value("just_a_string")).unwrap_err();
        assert!(matches!(err, ComposerError::InvalidDefaults { .. }));
    }

    #[test]
    fn rejects_two_group_keys_in_one_entry() {
        let err = DefaultsList::from_value(&value("[{model: a, launcher: b}]")).unwrap_err();
        assert!(matches!(err, ComposerError::InvalidDefaults { .. }));
    }

    #[test]
    fn merge_replaces_existing_group_in_place() {
        let mut primary = DefaultsList::from_value(&value("[{model: a}, {launcher: local}]")).unwrap();
        let secondary = DefaultsList::from_value(&value("[{model: b}]")).unwrap();
        DefaultsList::merge(&mut primary, &secondary);
        assert_eq!(primary.len(), 2);
        assert_eq!(primary.group_mut("model").unwrap().choice, Some("b".to_string()));
    }

    #[test]
    fn merge_appends_new_group() {
        let mut primary = DefaultsList::from_value(&value("[{model: a}]")).unwrap();
        let secondary = DefaultsList::from_value(&value("[{optimizer: adam}]")).unwrap();
        DefaultsList::merge(&mut primary, &secondary);
        assert_eq!(primary.len(), 2);
        assert!(primary.has_group("optimizer"));
    }

    #[test]
    fn merge_empty_secondary_is_identity() {
        let mut primary = DefaultsList::from_value(&value("[{model: a}]")).unwrap();
        let before = primary.len();
        DefaultsList::merge(&mut primary, &DefaultsList::new());
        assert_eq!(primary.len(), before);
    }

    #[test]
    fn null_choice_means_drop() {
        let list = DefaultsList::from_value(&value("[{model: null}]")).unwrap();
        let entry = list.iter().next().unwrap();
        if let DefaultsEntry::Group(b) = entry {
            assert_eq!(b.choice, None);
        } else {
            panic!("expected group entry");
        }
    }
}
