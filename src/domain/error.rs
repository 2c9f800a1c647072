//! Domain error types.
//!
//! Editing operations in the domain never fail: stale indices no-op,
//! unknown indicator names degrade to empty parameter lists, and malformed
//! literals pass through for the engine to reject. Errors here cover the
//! boundary instead: configuration files, workspace files, and output I/O.

/// Top-level error type for quantifi.
#[derive(Debug, thiserror::Error)]
pub enum QuantifiError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("workspace error in {file}: {reason}")]
    Workspace { file: String, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&QuantifiError> for std::process::ExitCode {
    fn from(err: &QuantifiError) -> Self {
        let code: u8 = match err {
            QuantifiError::Io(_) => 1,
            QuantifiError::ConfigParse { .. }
            | QuantifiError::ConfigMissing { .. }
            | QuantifiError::ConfigInvalid { .. } => 2,
            QuantifiError::Workspace { .. } => 3,
            QuantifiError::Json(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}
