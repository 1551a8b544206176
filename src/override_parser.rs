//! Splits raw `key=value` override tokens handed in by the caller (no
//! argument parser lives in this crate — see the crate root docs).

use crate::error::ComposerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOverride {
    pub key: String,
    pub value: String,
}

impl RawOverride {
    /// A comma in the value marks a multi-run sweep expansion; this crate
    /// only marks the affected defaults entry for deferral, it never expands it.
    pub fn is_sweep(&self) -> bool {
        self.value.contains(',')
    }

    pub fn is_removal(&self) -> bool {
        self.value == "null"
    }
}

pub fn parse(tokens: &[String]) -> Result<Vec<RawOverride>, ComposerError> {
    tokens
        .iter()
        .map(|token| {
            token
                .split_once('=')
                .map(|(key, value)| RawOverride {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .ok_or_else(|| ComposerError::InvalidOverride {
                    token: token.clone(),
                })
        })
        .collect()
}
