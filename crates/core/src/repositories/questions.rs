//! The flat question record store.
//!
//! Each questionnaire directory carries a single `questions.json` holding the
//! flat list of question records for that questionnaire. The store is the
//! durable side of the hierarchy: records reference their parent by id and
//! carry a sibling `order_index`; [`crate::hierarchy::organize`] rebuilds the
//! forest on demand.
//!
//! Policies:
//! - A missing `questions.json` reads as an empty list — indistinguishable
//!   from a genuinely empty questionnaire.
//! - `parent_question_id` and `questionnaire_id` are immutable after
//!   creation.
//! - Deleting a question removes only the targeted record; descendants keep
//!   their (now dangling) parent reference and are promoted to roots by the
//!   next organize.
//! - Writes are whole-file and last-writer-wins; concurrent-session
//!   transactionality is out of scope.

use crate::config::CoreConfig;
use crate::constants::QUESTIONS_FILENAME;
use crate::error::{FormError, FormResult};
use crate::hierarchy::{self, QuestionTreeNode};
use crate::question::{NewQuestion, Question, QuestionUpdate};
use crate::repositories::questionnaires::{Initialised, QuestionnaireService};
use crate::uuid::EntityUuid;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Store for the question records of one questionnaire.
#[derive(Clone, Debug)]
pub struct QuestionStore {
    questionnaire: QuestionnaireService<Initialised>,
}

impl QuestionStore {
    /// Creates a store for an existing questionnaire.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] for a non-canonical identifier, or
    /// [`FormError::QuestionnaireNotFound`] if the questionnaire does not
    /// exist.
    pub fn with_id(cfg: Arc<CoreConfig>, questionnaire_id: &str) -> FormResult<Self> {
        Ok(Self {
            questionnaire: QuestionnaireService::with_id(cfg, questionnaire_id)?,
        })
    }

    /// Creates a store from an already-validated questionnaire service.
    pub fn for_questionnaire(questionnaire: QuestionnaireService<Initialised>) -> Self {
        Self { questionnaire }
    }

    /// Finds the store holding the question with `id`.
    ///
    /// Question records are stored per questionnaire, so looking one up by id
    /// alone scans the questionnaires. Fine at administrative scale; callers
    /// that already know the questionnaire should use [`QuestionStore::with_id`]
    /// and [`QuestionStore::get`] directly.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::QuestionNotFound`] if no questionnaire holds the
    /// record; storage errors other than not-found are propagated.
    pub fn locate(cfg: Arc<CoreConfig>, id: &EntityUuid) -> FormResult<(Self, Question)> {
        let questionnaires =
            crate::repositories::questionnaires::QuestionnaireService::new(cfg.clone()).list();
        for questionnaire in questionnaires {
            let store = Self::with_id(cfg.clone(), &questionnaire.id.to_string())?;
            match store.get(id) {
                Ok(question) => return Ok((store, question)),
                Err(FormError::QuestionNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(FormError::QuestionNotFound(id.to_string()))
    }

    /// Returns the owning questionnaire's identifier.
    pub fn questionnaire_id(&self) -> &EntityUuid {
        self.questionnaire.questionnaire_id()
    }

    fn records_path(&self) -> PathBuf {
        self.questionnaire.dir().join(QUESTIONS_FILENAME)
    }

    /// Reads the flat question record list.
    ///
    /// A missing record file is an empty questionnaire, not an error.
    pub fn list(&self) -> FormResult<Vec<Question>> {
        let path = self.records_path();
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).map_err(FormError::FileRead)?;
        serde_json::from_str(&contents).map_err(FormError::Deserialization)
    }

    /// Reads the records and organizes them into the ordered forest.
    pub fn organized(&self) -> FormResult<Vec<QuestionTreeNode>> {
        Ok(hierarchy::organize(&self.list()?))
    }

    /// Returns a single question record.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::QuestionNotFound`] if no record has `id`.
    pub fn get(&self, id: &EntityUuid) -> FormResult<Question> {
        self.list()?
            .into_iter()
            .find(|question| &question.id == id)
            .ok_or_else(|| FormError::QuestionNotFound(id.to_string()))
    }

    /// Creates a question record.
    ///
    /// When `order_index` is not supplied, the next index within the target
    /// sibling group is assigned: strictly greater than every existing index
    /// in that group, or `1` for the first sibling. Options supplied for a
    /// type that takes none are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] if the record violates the model
    /// invariants (see [`Question::validate`]), or a storage error.
    pub fn create(&self, new: NewQuestion) -> FormResult<Question> {
        if &new.questionnaire_id != self.questionnaire_id() {
            return Err(FormError::InvalidInput(format!(
                "question belongs to questionnaire {}, store is for {}",
                new.questionnaire_id,
                self.questionnaire_id()
            )));
        }

        let mut records = self.list()?;

        let order_index = match new.order_index {
            Some(explicit) => explicit,
            None => {
                let forest = hierarchy::organize(&records);
                let group =
                    hierarchy::sibling_group(&forest, new.parent_question_id.as_ref());
                hierarchy::next_order_index(group)
            }
        };

        let options = if new.question_type.requires_options() {
            new.options
        } else {
            Vec::new()
        };

        let question = Question {
            id: EntityUuid::new(),
            questionnaire_id: new.questionnaire_id,
            parent_question_id: new.parent_question_id,
            trigger_value: new.trigger_value,
            order_index,
            text: new.text,
            question_type: new.question_type,
            options,
            created_at: Utc::now(),
        };
        question.validate()?;

        records.push(question.clone());
        self.write(&records)?;
        Ok(question)
    }

    /// Applies a partial update to a question record.
    ///
    /// Text, type, order index, trigger value and options may change; the
    /// parent reference and owning questionnaire may not. Changing to a type
    /// that takes no options clears any stored options.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::QuestionNotFound`] for an unknown id, or
    /// [`FormError::InvalidInput`] if the updated record violates the model
    /// invariants.
    pub fn update(&self, id: &EntityUuid, update: QuestionUpdate) -> FormResult<Question> {
        let mut records = self.list()?;
        let position = records
            .iter()
            .position(|question| &question.id == id)
            .ok_or_else(|| FormError::QuestionNotFound(id.to_string()))?;

        let question = &mut records[position];
        if let Some(text) = update.text {
            question.text = text;
        }
        if let Some(question_type) = update.question_type {
            question.question_type = question_type;
        }
        if let Some(order_index) = update.order_index {
            question.order_index = order_index;
        }
        if let Some(trigger_value) = update.trigger_value {
            question.trigger_value = trigger_value;
        }
        if let Some(options) = update.options {
            question.options = options;
        }
        if !question.question_type.requires_options() {
            question.options.clear();
        }
        question.validate()?;

        let updated = question.clone();
        self.write(&records)?;
        Ok(updated)
    }

    /// Deletes a single question record.
    ///
    /// Descendants are left in place; they are promoted to roots the next
    /// time the questionnaire is organized.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::QuestionNotFound`] for an unknown id.
    pub fn delete(&self, id: &EntityUuid) -> FormResult<()> {
        let mut records = self.list()?;
        let before = records.len();
        records.retain(|question| &question.id != id);
        if records.len() == before {
            return Err(FormError::QuestionNotFound(id.to_string()));
        }
        self.write(&records)
    }

    fn write(&self, records: &[Question]) -> FormResult<()> {
        let json = serde_json::to_string_pretty(records).map_err(FormError::Serialization)?;
        fs::write(self.records_path(), json).map_err(FormError::FileWrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{QuestionOption, QuestionType};
    use crate::questionnaire::NewQuestionnaire;
    use crate::repositories::questionnaires::Uninitialised;
    use medforms_types::NonEmptyText;

    fn store() -> (tempfile::TempDir, QuestionStore) {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Arc::new(
            CoreConfig::new(tmp.path().to_path_buf(), "medforms.test.1".into()).unwrap(),
        );
        let questionnaire = QuestionnaireService::<Uninitialised>::new(cfg)
            .initialise(NewQuestionnaire {
                title: NonEmptyText::new("Pre-operative assessment").unwrap(),
                icon: "stethoscope".into(),
                user_id: EntityUuid::new(),
                responsibles: vec![],
            })
            .unwrap();
        (tmp, QuestionStore::for_questionnaire(questionnaire))
    }

    fn new_text_question(store: &QuestionStore, text: &str) -> NewQuestion {
        NewQuestion {
            questionnaire_id: store.questionnaire_id().clone(),
            parent_question_id: None,
            trigger_value: None,
            order_index: None,
            text: NonEmptyText::new(text).unwrap(),
            question_type: QuestionType::Text,
            options: vec![],
        }
    }

    fn yes_no_options() -> Vec<QuestionOption> {
        vec![
            QuestionOption {
                label: NonEmptyText::new("Yes").unwrap(),
                value: NonEmptyText::new("yes").unwrap(),
            },
            QuestionOption {
                label: NonEmptyText::new("No").unwrap(),
                value: NonEmptyText::new("no").unwrap(),
            },
        ]
    }

    #[test]
    fn empty_questionnaire_lists_no_questions() {
        let (_tmp, store) = store();
        assert!(store.list().unwrap().is_empty());
        assert!(store.organized().unwrap().is_empty());
    }

    #[test]
    fn missing_record_file_reads_as_empty() {
        let (_tmp, store) = store();
        fs::remove_file(store.records_path()).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn create_assigns_sequential_root_indices() {
        let (_tmp, store) = store();
        let first = store.create(new_text_question(&store, "First")).unwrap();
        let second = store.create(new_text_question(&store, "Second")).unwrap();
        assert_eq!(first.order_index, 1);
        assert_eq!(second.order_index, 2);
    }

    #[test]
    fn create_numbers_each_sibling_group_independently() {
        let (_tmp, store) = store();
        let root = store
            .create(NewQuestion {
                question_type: QuestionType::Radio,
                options: yes_no_options(),
                ..new_text_question(&store, "Do you smoke?")
            })
            .unwrap();
        store.create(new_text_question(&store, "Second root")).unwrap();

        let child = store
            .create(NewQuestion {
                parent_question_id: Some(root.id.clone()),
                trigger_value: Some("yes".into()),
                ..new_text_question(&store, "How many per day?")
            })
            .unwrap();

        // The root group already has indices 1 and 2; the child group starts
        // over at 1.
        assert_eq!(child.order_index, 1);
    }

    #[test]
    fn create_respects_explicit_order_index() {
        let (_tmp, store) = store();
        let question = store
            .create(NewQuestion {
                order_index: Some(40),
                ..new_text_question(&store, "Pinned late")
            })
            .unwrap();
        assert_eq!(question.order_index, 40);

        let next = store.create(new_text_question(&store, "After")).unwrap();
        assert_eq!(next.order_index, 41);
    }

    #[test]
    fn create_rejects_choice_question_without_options() {
        let (_tmp, store) = store();
        let result = store.create(NewQuestion {
            question_type: QuestionType::Select,
            ..new_text_question(&store, "Blood type")
        });
        assert!(matches!(result, Err(FormError::InvalidInput(_))));
    }

    #[test]
    fn create_ignores_options_on_free_text_question() {
        let (_tmp, store) = store();
        let question = store
            .create(NewQuestion {
                options: yes_no_options(),
                ..new_text_question(&store, "Notes")
            })
            .unwrap();
        assert!(question.options.is_empty());
    }

    #[test]
    fn create_rejects_record_for_another_questionnaire() {
        let (_tmp, store) = store();
        let result = store.create(NewQuestion {
            questionnaire_id: EntityUuid::new(),
            ..new_text_question(&store, "Stray")
        });
        assert!(matches!(result, Err(FormError::InvalidInput(_))));
    }

    #[test]
    fn get_and_update_round_trip() {
        let (_tmp, store) = store();
        let created = store.create(new_text_question(&store, "Old text")).unwrap();

        let updated = store
            .update(
                &created.id,
                QuestionUpdate {
                    text: Some(NonEmptyText::new("New text").unwrap()),
                    order_index: Some(9),
                    ..QuestionUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.text.as_str(), "New text");
        assert_eq!(updated.order_index, 9);

        let fetched = store.get(&created.id).unwrap();
        assert_eq!(fetched, updated);
        // Identity and ancestry are immutable.
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.parent_question_id, created.parent_question_id);
    }

    #[test]
    fn update_clears_trigger_with_explicit_none() {
        let (_tmp, store) = store();
        let parent = store
            .create(NewQuestion {
                question_type: QuestionType::Radio,
                options: yes_no_options(),
                ..new_text_question(&store, "Parent")
            })
            .unwrap();
        let child = store
            .create(NewQuestion {
                parent_question_id: Some(parent.id.clone()),
                trigger_value: Some("yes".into()),
                ..new_text_question(&store, "Child")
            })
            .unwrap();

        let updated = store
            .update(
                &child.id,
                QuestionUpdate {
                    trigger_value: Some(None),
                    ..QuestionUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.trigger_value, None);
    }

    #[test]
    fn update_to_free_text_type_clears_options() {
        let (_tmp, store) = store();
        let created = store
            .create(NewQuestion {
                question_type: QuestionType::Radio,
                options: yes_no_options(),
                ..new_text_question(&store, "Choice")
            })
            .unwrap();

        let updated = store
            .update(
                &created.id,
                QuestionUpdate {
                    question_type: Some(QuestionType::Textarea),
                    ..QuestionUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.question_type, QuestionType::Textarea);
        assert!(updated.options.is_empty());
    }

    #[test]
    fn update_unknown_question_fails() {
        let (_tmp, store) = store();
        let result = store.update(&EntityUuid::new(), QuestionUpdate::default());
        assert!(matches!(result, Err(FormError::QuestionNotFound(_))));
    }

    #[test]
    fn delete_removes_only_the_targeted_record() {
        let (_tmp, store) = store();
        let parent = store
            .create(NewQuestion {
                question_type: QuestionType::Radio,
                options: yes_no_options(),
                ..new_text_question(&store, "Parent")
            })
            .unwrap();
        let child = store
            .create(NewQuestion {
                parent_question_id: Some(parent.id.clone()),
                trigger_value: Some("yes".into()),
                ..new_text_question(&store, "Child")
            })
            .unwrap();

        store.delete(&parent.id).unwrap();

        // The child survives and is promoted to a root on organize.
        let forest = store.organized().unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].question.id, child.id);
        assert!(forest[0].child_questions.is_empty());
    }

    #[test]
    fn delete_unknown_question_fails() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.delete(&EntityUuid::new()),
            Err(FormError::QuestionNotFound(_))
        ));
    }

    #[test]
    fn locate_scans_across_questionnaires() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Arc::new(
            CoreConfig::new(tmp.path().to_path_buf(), "medforms.test.1".into()).unwrap(),
        );
        let make = |title: &str| {
            let questionnaire = QuestionnaireService::<Uninitialised>::new(cfg.clone())
                .initialise(NewQuestionnaire {
                    title: NonEmptyText::new(title).unwrap(),
                    icon: "clipboard".into(),
                    user_id: EntityUuid::new(),
                    responsibles: vec![],
                })
                .unwrap();
            QuestionStore::for_questionnaire(questionnaire)
        };
        let first = make("First");
        let second = make("Second");
        let question = second
            .create(new_text_question(&second, "Findable"))
            .unwrap();

        let (found_store, found) = QuestionStore::locate(cfg.clone(), &question.id).unwrap();
        assert_eq!(found_store.questionnaire_id(), second.questionnaire_id());
        assert_eq!(found, question);
        assert_ne!(found_store.questionnaire_id(), first.questionnaire_id());

        assert!(matches!(
            QuestionStore::locate(cfg, &EntityUuid::new()),
            Err(FormError::QuestionNotFound(_))
        ));
    }

    #[test]
    fn organized_reflects_parent_links_and_order() {
        let (_tmp, store) = store();
        let root_b = store
            .create(NewQuestion {
                order_index: Some(2),
                ..new_text_question(&store, "Root B")
            })
            .unwrap();
        let root_a = store
            .create(NewQuestion {
                order_index: Some(1),
                question_type: QuestionType::Radio,
                options: yes_no_options(),
                ..new_text_question(&store, "Root A")
            })
            .unwrap();
        store
            .create(NewQuestion {
                parent_question_id: Some(root_a.id.clone()),
                trigger_value: Some("yes".into()),
                ..new_text_question(&store, "Child of A")
            })
            .unwrap();

        let forest = store.organized().unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].question.id, root_a.id);
        assert_eq!(forest[1].question.id, root_b.id);
        assert_eq!(forest[0].child_questions.len(), 1);
    }
}
