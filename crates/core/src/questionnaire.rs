//! Questionnaire metadata.
//!
//! A questionnaire is the named template that owns a tree of questions. The
//! metadata here is thin administrative data; the structural content lives in
//! the question records (see [`crate::question`]).

use crate::uuid::EntityUuid;
use chrono::{DateTime, Utc};
use medforms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// Professional role of a questionnaire responsible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsibleRole {
    Doctor,
    Nurse,
    Technician,
    Other,
}

/// Registry a responsible's professional registration belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    /// Medical council registration.
    Crm,
    /// Nursing council registration.
    Coren,
    Other,
}

/// A clinician accountable for a questionnaire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responsible {
    pub name: NonEmptyText,
    pub role: ResponsibleRole,
    pub registration_type: RegistrationType,
    pub registration_id: NonEmptyText,
}

/// Persisted questionnaire metadata (`questionnaire.yaml`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub id: EntityUuid,
    pub title: NonEmptyText,
    /// Icon name used by the administrative UI.
    pub icon: String,
    /// Identifier of the creating user.
    pub user_id: EntityUuid,
    #[serde(default)]
    pub responsibles: Vec<Responsible>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a questionnaire.
#[derive(Clone, Debug)]
pub struct NewQuestionnaire {
    pub title: NonEmptyText,
    pub icon: String,
    pub user_id: EntityUuid,
    pub responsibles: Vec<Responsible>,
}

/// Partial update for questionnaire metadata. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct QuestionnaireUpdate {
    pub title: Option<NonEmptyText>,
    pub icon: Option<String>,
}
