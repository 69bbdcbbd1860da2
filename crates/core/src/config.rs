//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the
//! stores. Request handlers never read process-wide environment variables,
//! which keeps behaviour consistent across multi-threaded runtimes and test
//! harnesses.

use crate::constants::QUESTIONNAIRES_DIR_NAME;
use crate::{FormError, FormResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    form_data_dir: PathBuf,
    namespace: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] if `namespace` is empty.
    pub fn new(form_data_dir: PathBuf, namespace: String) -> FormResult<Self> {
        if namespace.trim().is_empty() {
            return Err(FormError::InvalidInput("namespace cannot be empty".into()));
        }

        Ok(Self {
            form_data_dir,
            namespace,
        })
    }

    pub fn form_data_dir(&self) -> &Path {
        &self.form_data_dir
    }

    pub fn questionnaires_dir(&self) -> PathBuf {
        self.form_data_dir.join(QUESTIONNAIRES_DIR_NAME)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Resolve the form data directory from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, the compiled-in default is used.
pub fn form_data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate::constants::DEFAULT_FORM_DATA_DIR))
}
