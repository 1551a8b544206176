use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ComposerError {
    #[error("primary config '{name}' not found on search path: [{}]", .search_path.join(", "))]
    MissingPrimaryConfig {
        name: String,
        search_path: Vec<String>,
    },

    #[error("could not find '{choice}' in group '{group}' (available: [{}])", .options.join(", "))]
    MissingConfig {
        group: String,
        choice: String,
        options: Vec<String>,
    },

    #[error("invalid defaults list: {reason}")]
    InvalidDefaults { reason: String },

    #[error("override '{token}' is not a valid key=value pair")]
    InvalidOverride { token: String },

    #[error("package '{module}' exists but is not importable (missing package init)")]
    PackageNotImportable { module: String },

    #[error("strict mode: key '{key}' does not exist in the composed configuration")]
    StrictViolation { key: String },

    #[error("document root of '{path}' must be a mapping")]
    InvalidDocumentRoot { path: String },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
