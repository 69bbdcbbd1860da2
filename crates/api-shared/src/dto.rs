//! Request and response types shared by the REST API and its clients.
//!
//! Field names follow the JSON wire convention of the administrative UI
//! (camelCase); identifiers and question types travel as plain strings and
//! are validated at the API boundary before reaching the core.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A questionnaire responsible on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponsibleDto {
    pub name: String,
    /// One of `doctor`, `nurse`, `technician`, `other`.
    pub role: String,
    /// One of `crm`, `coren`, `other`.
    pub registration_type: String,
    pub registration_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionnaireReq {
    pub title: String,
    pub icon: String,
    pub user_id: String,
    #[serde(default)]
    pub responsibles: Vec<ResponsibleDto>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionnaireReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireRes {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub user_id: String,
    pub responsibles: Vec<ResponsibleDto>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListQuestionnairesRes {
    pub questionnaires: Vec<QuestionnaireRes>,
}

/// One fixed answer choice on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionOptionDto {
    pub label: String,
    pub value: String,
}

/// Body of `POST /questions/by-questionnaire`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsByQuestionnaireReq {
    pub questionnaire_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionReq {
    pub questionnaire_id: String,
    #[serde(default)]
    pub parent_question_id: Option<String>,
    #[serde(default)]
    pub trigger_value: Option<String>,
    /// Omit to have the next index in the target sibling group assigned.
    #[serde(default)]
    pub order_index: Option<i32>,
    pub text: String,
    /// One of `text`, `textarea`, `number`, `date`, `radio`, `checkbox`, `select`.
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<QuestionOptionDto>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionReq {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub order_index: Option<i32>,
    /// Omitted: unchanged. `null`: clear the trigger. String: set it.
    #[serde(default, deserialize_with = "double_option")]
    pub trigger_value: Option<Option<String>>,
    #[serde(default)]
    pub options: Option<Vec<QuestionOptionDto>>,
}

/// Distinguishes an omitted JSON field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRes {
    pub id: String,
    pub questionnaire_id: String,
    pub parent_question_id: Option<String>,
    pub trigger_value: Option<String>,
    pub order_index: i32,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub options: Vec<QuestionOptionDto>,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListQuestionsRes {
    pub questions: Vec<QuestionRes>,
}

/// A question with its recursively organized children.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTreeNodeRes {
    #[serde(flatten)]
    pub question: QuestionRes,
    pub child_questions: Vec<QuestionTreeNodeRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionTreeRes {
    pub questions: Vec<QuestionTreeNodeRes>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteRes {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_question_req_distinguishes_missing_from_null_trigger() {
        let omitted: UpdateQuestionReq = serde_json::from_str(r#"{"text":"t"}"#).unwrap();
        assert_eq!(omitted.trigger_value, None);

        let cleared: UpdateQuestionReq =
            serde_json::from_str(r#"{"triggerValue":null}"#).unwrap();
        assert_eq!(cleared.trigger_value, Some(None));

        let set: UpdateQuestionReq =
            serde_json::from_str(r#"{"triggerValue":"yes"}"#).unwrap();
        assert_eq!(set.trigger_value, Some(Some("yes".into())));
    }

    #[test]
    fn create_question_req_uses_wire_names() {
        let req: CreateQuestionReq = serde_json::from_str(
            r#"{
                "questionnaireId": "550e8400-e29b-41d4-a716-446655440000",
                "parentQuestionId": null,
                "orderIndex": 2,
                "text": "Do you smoke?",
                "type": "radio",
                "options": [{"label": "Yes", "value": "yes"}]
            }"#,
        )
        .unwrap();
        assert_eq!(req.question_type, "radio");
        assert_eq!(req.order_index, Some(2));
        assert_eq!(req.options.len(), 1);
    }
}
