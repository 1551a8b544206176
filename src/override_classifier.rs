//! Splits raw overrides into the three phases described by the composer:
//! group-selection rewrites, "free" defaults additions, and residual
//! dotted-path sets applied after the merge. Phase 1 must fully complete
//! before phase 2 runs, so a key that is both an existing group and a
//! resolvable free-default group is always claimed by phase 1.

use crate::defaults::{DefaultsEntry, DefaultsList, GroupBinding, SWEEP_SENTINEL};
use crate::override_parser::RawOverride;

#[derive(Debug, Clone, Default)]
pub struct ClassifiedOverrides {
    pub group_consumed: Vec<RawOverride>,
    pub free_consumed: Vec<RawOverride>,
    pub residual: Vec<RawOverride>,
}

impl ClassifiedOverrides {
    pub fn applied(&self) -> impl Iterator<Item = &RawOverride> {
        self.group_consumed
            .iter()
            .chain(self.free_consumed.iter())
            .chain(self.residual.iter())
    }
}

/// `group_exists` answers whether a key names a resolvable group on the
/// search path (used only by phase 2).
pub fn classify(
    defaults: &mut DefaultsList,
    overrides: Vec<RawOverride>,
    group_exists: impl Fn(&str) -> bool,
) -> ClassifiedOverrides {
    let mut group_consumed = Vec::new();
    let mut remaining = Vec::new();

    // Phase 1: rewrite existing group bindings.
    for ov in overrides {
        if defaults.has_group(&ov.key) {
            if ov.is_sweep() {
                tracing::trace!(group = %ov.key, "deferring group to sweep sentinel");
                if let Some(binding) = defaults.group_mut(&ov.key) {
                    binding.choice = Some(SWEEP_SENTINEL.to_string());
                }
            } else if ov.is_removal() {
                tracing::trace!(group = %ov.key, "removing group from defaults list");
                defaults.remove_group(&ov.key);
            } else if let Some(binding) = defaults.group_mut(&ov.key) {
                tracing::trace!(group = %ov.key, choice = %ov.value, "rewriting group choice");
                binding.choice = Some(ov.value.clone());
            }
            group_consumed.push(ov);
        } else {
            remaining.push(ov);
        }
    }

    // Phase 2: append free defaults for overrides naming a resolvable group.
    let mut free_consumed = Vec::new();
    let mut residual = Vec::new();
    for ov in remaining {
        if ov.is_removal() {
            residual.push(ov);
            continue;
        }
        if group_exists(&ov.key) {
            let choice = if ov.is_sweep() {
                SWEEP_SENTINEL.to_string()
            } else {
                ov.value.clone()
            };
            tracing::trace!(group = %ov.key, choice = %choice, "appending free default");
            defaults.push(DefaultsEntry::Group(GroupBinding {
                group: ov.key.clone(),
                choice: Some(choice),
                optional: false,
            }));
            free_consumed.push(ov);
        } else {
            residual.push(ov);
        }
    }

    ClassifiedOverrides {
        group_consumed,
        free_consumed,
        residual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ov(key: &str, value: &str) -> RawOverride {
        RawOverride {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn defaults_with_model() -> DefaultsList {
        let mut d = DefaultsList::new();
        d.push(DefaultsEntry::Group(GroupBinding {
            group: "model".into(),
            choice: Some("a".into()),
            optional: false,
        }));
        d
    }

    #[test]
    fn phase1_rewrites_existing_group() {
        let mut defaults = defaults_with_model();
        let classified = classify(&mut defaults, vec![ov("model", "b")], |_| false);
        assert_eq!(classified.group_consumed.len(), 1);
        assert_eq!(defaults.group_mut("model").unwrap().choice, Some("b".into()));
    }

    #[test]
    fn phase1_null_drops_group() {
        let mut defaults = defaults_with_model();
        classify(&mut defaults, vec![ov("model", "null")], |_| false);
        assert!(!defaults.has_group("model"));
    }

    #[test]
    fn phase1_sweep_sets_sentinel() {
        let mut defaults = defaults_with_model();
        classify(&mut defaults, vec![ov("model", "a,b")], |_| false);
        assert_eq!(
            defaults.group_mut("model").unwrap().choice,
            Some(SWEEP_SENTINEL.to_string())
        );
    }

    #[test]
    fn phase2_appends_free_default() {
        let mut defaults = DefaultsList::new();
        let classified = classify(&mut defaults, vec![ov("optimizer", "adam")], |g| g == "optimizer");
        assert_eq!(classified.free_consumed.len(), 1);
        assert!(defaults.has_group("optimizer"));
    }

    #[test]
    fn phase2_skipped_for_non_group_key() {
        let mut defaults = DefaultsList::new();
        let classified = classify(&mut defaults, vec![ov("lr", "0.1")], |_| false);
        assert_eq!(classified.residual.len(), 1);
        assert_eq!(classified.residual[0].key, "lr");
    }

    #[test]
    fn phase1_wins_over_phase2_for_overlap() {
        let mut defaults = defaults_with_model();
        // "model" both already bound AND would resolve as a free-default group —
        // phase 1 must claim it, phase 2 should never see it.
        let classified = classify(&mut defaults, vec![ov("model", "c")], |g| g == "model");
        assert_eq!(classified.group_consumed.len(), 1);
        assert_eq!(classified.free_consumed.len(), 0);
        assert_eq!(defaults.group_mut("model").unwrap().choice, Some("c".into()));
    }

    #[test]
    fn disjointness_covers_every_override() {
        let mut defaults = defaults_with_model();
        let input = vec![ov("model", "b"), ov("optimizer", "adam"), ov("lr", "0.1")];
        let classified = classify(&mut defaults, input.clone(), |g| g == "optimizer");
        let total: Vec<_> = classified.applied().cloned().collect();
        assert_eq!(total.len(), input.len());
        for o in &input {
            assert!(total.contains(o));
        }
    }
}
