//! # Medforms Core
//!
//! Core business logic for the medforms questionnaire system.
//!
//! This crate contains pure data operations and file/folder management:
//! - The question record model and its structural invariants
//! - Organising flat question records into an ordered forest ([`hierarchy`])
//! - Conditional visibility evaluation for form fill ([`visibility`])
//! - Questionnaire and question storage with sharded JSON/YAML files
//!
//! **No API concerns**: authentication, HTTP servers and service interfaces
//! belong in `api-rest` and `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod hierarchy;
pub mod question;
pub mod questionnaire;
pub mod repositories;
pub mod uuid;
pub mod visibility;

pub use config::CoreConfig;
pub use error::{FormError, FormResult};
pub use hierarchy::{
    find_node, flatten, next_order_index, organize, sibling_group, QuestionTreeNode,
};
pub use question::{NewQuestion, Question, QuestionOption, QuestionType, QuestionUpdate};
pub use questionnaire::{
    NewQuestionnaire, Questionnaire, QuestionnaireUpdate, RegistrationType, Responsible,
    ResponsibleRole,
};
pub use repositories::questionnaires::QuestionnaireService;
pub use repositories::questions::QuestionStore;
pub use uuid::EntityUuid;
pub use visibility::{is_visible, visible_set, AnswerValue, RecordedAnswers};

pub use medforms_types::NonEmptyText;
