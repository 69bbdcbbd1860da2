//! Constants used throughout the medforms core crate.
//!
//! All path and filename constants live here to keep the storage layout
//! consistent across the codebase.

/// Default directory for form data storage when no explicit directory is configured.
pub const DEFAULT_FORM_DATA_DIR: &str = "form_data";

/// Directory name for questionnaire storage (sharded under the data dir).
pub const QUESTIONNAIRES_DIR_NAME: &str = "questionnaires";

/// Filename for questionnaire metadata files.
pub const QUESTIONNAIRE_FILENAME: &str = "questionnaire.yaml";

/// Filename for the flat question record file of a questionnaire.
pub const QUESTIONS_FILENAME: &str = "questions.json";
