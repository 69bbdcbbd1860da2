//! The question record model.
//!
//! A questionnaire's questions are persisted as a *flat* list of records; the
//! parent/child structure exists only as back-references (`parent_question_id`)
//! plus a per-sibling-group `order_index`. The [`crate::hierarchy`] module
//! turns the flat list into an ordered forest.

use crate::error::{FormError, FormResult};
use crate::uuid::EntityUuid;
use chrono::{DateTime, Utc};
use medforms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// The closed set of answer-input kinds a question can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Number,
    Date,
    Radio,
    Checkbox,
    Select,
}

impl QuestionType {
    /// Whether this kind of question must carry a fixed set of answer options.
    ///
    /// Keeping this a function of the tag (rather than scattered comparisons)
    /// means the options invariant is enforced in exactly one place.
    pub fn requires_options(self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox | Self::Select)
    }

    /// Whether answers to this kind of question are multi-valued.
    pub fn is_multi_valued(self) -> bool {
        matches!(self, Self::Checkbox)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Date => "date",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for QuestionType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "textarea" => Ok(Self::Textarea),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "radio" => Ok(Self::Radio),
            "checkbox" => Ok(Self::Checkbox),
            "select" => Ok(Self::Select),
            other => Err(FormError::InvalidInput(format!(
                "unknown question type: '{other}'"
            ))),
        }
    }
}

/// One fixed answer choice for a `radio`, `checkbox` or `select` question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: NonEmptyText,
    pub value: NonEmptyText,
}

/// A persisted question record.
///
/// `id` and `questionnaire_id` are assigned at creation and immutable, as is
/// `parent_question_id` — moving a question under a different parent means
/// deleting and re-creating it, mirroring the administrative UI flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: EntityUuid,
    pub questionnaire_id: EntityUuid,
    #[serde(default)]
    pub parent_question_id: Option<EntityUuid>,
    /// Exact parent answer required for this question to be shown. Meaningful
    /// only when `parent_question_id` is set; `None` means "always shown once
    /// the parent is shown".
    #[serde(default)]
    pub trigger_value: Option<String>,
    pub order_index: i32,
    pub text: NonEmptyText,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Checks the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] if:
    /// - the type requires options but none are present,
    /// - options are present on a type that takes none, or
    /// - a trigger value is set on a root question.
    pub fn validate(&self) -> FormResult<()> {
        if self.question_type.requires_options() && self.options.is_empty() {
            return Err(FormError::InvalidInput(format!(
                "question type '{}' requires at least one option",
                self.question_type
            )));
        }
        if !self.question_type.requires_options() && !self.options.is_empty() {
            return Err(FormError::InvalidInput(format!(
                "question type '{}' does not take options",
                self.question_type
            )));
        }
        if self.parent_question_id.is_none() && self.trigger_value.is_some() {
            return Err(FormError::InvalidInput(
                "trigger value is only meaningful on a question with a parent".into(),
            ));
        }
        Ok(())
    }
}

/// Input for creating a question record.
///
/// `order_index` may be omitted, in which case the store assigns the next
/// index within the target sibling group (see [`crate::hierarchy::next_order_index`]).
#[derive(Clone, Debug)]
pub struct NewQuestion {
    pub questionnaire_id: EntityUuid,
    pub parent_question_id: Option<EntityUuid>,
    pub trigger_value: Option<String>,
    pub order_index: Option<i32>,
    pub text: NonEmptyText,
    pub question_type: QuestionType,
    pub options: Vec<QuestionOption>,
}

/// Partial update for a question record.
///
/// `None` leaves a field unchanged. `trigger_value` is doubly optional so a
/// caller can distinguish "leave as is" (`None`) from "clear the trigger"
/// (`Some(None)`).
#[derive(Clone, Debug, Default)]
pub struct QuestionUpdate {
    pub text: Option<NonEmptyText>,
    pub question_type: Option<QuestionType>,
    pub order_index: Option<i32>,
    pub trigger_value: Option<Option<String>>,
    pub options: Option<Vec<QuestionOption>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(label: &str, value: &str) -> QuestionOption {
        QuestionOption {
            label: NonEmptyText::new(label).unwrap(),
            value: NonEmptyText::new(value).unwrap(),
        }
    }

    fn base_question(question_type: QuestionType, options: Vec<QuestionOption>) -> Question {
        Question {
            id: EntityUuid::new(),
            questionnaire_id: EntityUuid::new(),
            parent_question_id: None,
            trigger_value: None,
            order_index: 1,
            text: NonEmptyText::new("Do you smoke?").unwrap(),
            question_type,
            options,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn choice_types_require_options() {
        assert!(QuestionType::Radio.requires_options());
        assert!(QuestionType::Checkbox.requires_options());
        assert!(QuestionType::Select.requires_options());
        assert!(!QuestionType::Text.requires_options());
        assert!(!QuestionType::Textarea.requires_options());
        assert!(!QuestionType::Number.requires_options());
        assert!(!QuestionType::Date.requires_options());
    }

    #[test]
    fn validate_rejects_choice_question_without_options() {
        let question = base_question(QuestionType::Radio, vec![]);
        assert!(question.validate().is_err());
    }

    #[test]
    fn validate_rejects_options_on_free_text_question() {
        let question = base_question(QuestionType::Text, vec![option("Yes", "yes")]);
        assert!(question.validate().is_err());
    }

    #[test]
    fn validate_rejects_trigger_on_root_question() {
        let mut question = base_question(QuestionType::Text, vec![]);
        question.trigger_value = Some("yes".into());
        assert!(question.validate().is_err());
    }

    #[test]
    fn validate_accepts_triggered_child_with_options() {
        let mut question = base_question(
            QuestionType::Select,
            vec![option("Yes", "yes"), option("No", "no")],
        );
        question.parent_question_id = Some(EntityUuid::new());
        question.trigger_value = Some("yes".into());
        assert!(question.validate().is_ok());
    }

    #[test]
    fn question_type_round_trips_through_strings() {
        for (name, ty) in [
            ("text", QuestionType::Text),
            ("textarea", QuestionType::Textarea),
            ("number", QuestionType::Number),
            ("date", QuestionType::Date),
            ("radio", QuestionType::Radio),
            ("checkbox", QuestionType::Checkbox),
            ("select", QuestionType::Select),
        ] {
            assert_eq!(name.parse::<QuestionType>().unwrap(), ty);
            assert_eq!(ty.to_string(), name);
        }
        assert!("signature".parse::<QuestionType>().is_err());
    }

    #[test]
    fn record_serialises_with_camel_case_wire_names() {
        let mut question = base_question(QuestionType::Radio, vec![option("Yes", "yes")]);
        question.parent_question_id = Some(EntityUuid::new());
        question.trigger_value = Some("yes".into());

        let json = serde_json::to_value(&question).unwrap();
        assert!(json.get("questionnaireId").is_some());
        assert!(json.get("parentQuestionId").is_some());
        assert!(json.get("triggerValue").is_some());
        assert!(json.get("orderIndex").is_some());
        assert_eq!(json.get("type").unwrap(), "radio");
    }
}
