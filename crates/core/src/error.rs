#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("questionnaire not found: {0}")]
    QuestionnaireNotFound(String),
    #[error("question not found: {0}")]
    QuestionNotFound(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create questionnaire directory: {0}")]
    QuestionnaireDirCreation(std::io::Error),
    #[error(
        "initialise failed and cleanup also failed (path: {path}): init={init_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterInitialiseFailed {
        path: std::path::PathBuf,
        #[source]
        init_error: Box<FormError>,
        cleanup_error: std::io::Error,
    },
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record file: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialise questions: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialise questions: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to serialise questionnaire metadata: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialise questionnaire metadata: {0}")]
    YamlDeserialization(serde_yaml::Error),

    #[error("invalid text: {0}")]
    Text(#[from] medforms_types::TextError),
}

pub type FormResult<T> = std::result::Result<T, FormError>;
