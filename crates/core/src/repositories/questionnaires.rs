//! Questionnaire metadata storage.
//!
//! Questionnaires are stored one-per-directory in a sharded structure:
//!
//! ```text
//! questionnaires/
//!   <s1>/
//!     <s2>/
//!       <uuid>/
//!         questionnaire.yaml   # metadata (title, icon, owner, responsibles)
//!         questions.json       # flat question records (see questions store)
//! ```
//!
//! where `s1` and `s2` are the first four hex digits of the identifier.
//!
//! This module contains **only** data operations — authentication, HTTP
//! serving and other API concerns live in `api-rest`/`api-shared`.
//!
//! Writes are last-writer-wins; transactional guarantees across concurrent
//! administrator sessions are a caller concern.

use crate::config::CoreConfig;
use crate::constants::QUESTIONNAIRE_FILENAME;
use crate::error::{FormError, FormResult};
use crate::questionnaire::{NewQuestionnaire, Questionnaire, QuestionnaireUpdate};
use crate::repositories::helpers::create_unique_sharded_dir;
use crate::uuid::EntityUuid;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Marker type: questionnaire does not yet exist. Only `initialise()` is
/// available in this state.
#[derive(Clone, Copy, Debug)]
pub struct Uninitialised;

/// Marker type: questionnaire exists with a known identifier.
#[derive(Clone, Debug)]
pub struct Initialised {
    questionnaire_id: EntityUuid,
}

// ============================================================================
// QUESTIONNAIRE SERVICE
// ============================================================================

/// Service for questionnaire metadata operations.
///
/// Uses the type-state pattern: the generic parameter `S` is either
/// [`Uninitialised`] or [`Initialised`], so reading or updating a
/// questionnaire that was never created is a compile-time error.
#[derive(Clone, Debug)]
pub struct QuestionnaireService<S> {
    cfg: Arc<CoreConfig>,
    state: S,
}

impl QuestionnaireService<Uninitialised> {
    /// Creates a questionnaire service in the uninitialised state.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            state: Uninitialised,
        }
    }

    /// Creates a new questionnaire with a fresh identifier.
    ///
    /// Allocates a sharded directory, writes `questionnaire.yaml` and an
    /// empty `questions.json`, and returns the service in the initialised
    /// state. **Consumes `self`**, so `initialise()` cannot be called twice
    /// on the same service.
    ///
    /// # Errors
    ///
    /// Returns `FormError` if directory allocation, serialisation or a file
    /// write fails. On failure the partially-created directory is removed; if
    /// that cleanup also fails, [`FormError::CleanupAfterInitialiseFailed`]
    /// reports both errors.
    pub fn initialise(
        self,
        new: NewQuestionnaire,
    ) -> FormResult<QuestionnaireService<Initialised>> {
        let questionnaires_dir = self.cfg.questionnaires_dir();
        fs::create_dir_all(&questionnaires_dir).map_err(FormError::StorageDirCreation)?;

        let (questionnaire_id, dir) =
            create_unique_sharded_dir(&questionnaires_dir, EntityUuid::new)?;

        let now = Utc::now();
        let questionnaire = Questionnaire {
            id: questionnaire_id.clone(),
            title: new.title,
            icon: new.icon,
            user_id: new.user_id,
            responsibles: new.responsibles,
            created_at: now,
            updated_at: now,
        };

        if let Err(init_error) = write_metadata_and_empty_records(&dir, &questionnaire) {
            return match fs::remove_dir_all(&dir) {
                Ok(()) => Err(init_error),
                Err(cleanup_error) => Err(FormError::CleanupAfterInitialiseFailed {
                    path: dir,
                    init_error: Box::new(init_error),
                    cleanup_error,
                }),
            };
        }

        Ok(QuestionnaireService {
            cfg: self.cfg,
            state: Initialised { questionnaire_id },
        })
    }

    /// Lists all questionnaires by traversing the sharded directory tree.
    ///
    /// Unreadable or unparsable metadata files are logged with a warning and
    /// skipped rather than failing the whole listing.
    pub fn list(&self) -> Vec<Questionnaire> {
        let mut questionnaires = Vec::new();

        for dir in sharded_leaf_dirs(&self.cfg.questionnaires_dir()) {
            let metadata_path = dir.join(QUESTIONNAIRE_FILENAME);
            if !metadata_path.is_file() {
                continue;
            }
            match fs::read_to_string(&metadata_path) {
                Ok(contents) => match serde_yaml::from_str::<Questionnaire>(&contents) {
                    Ok(questionnaire) => questionnaires.push(questionnaire),
                    Err(e) => {
                        tracing::warn!(
                            "failed to parse questionnaire metadata {}: {}",
                            metadata_path.display(),
                            e
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "failed to read questionnaire metadata {}: {}",
                        metadata_path.display(),
                        e
                    );
                }
            }
        }

        questionnaires.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        questionnaires
    }
}

impl QuestionnaireService<Initialised> {
    /// Creates a service for an existing questionnaire.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] if `questionnaire_id` is not a
    /// canonical UUID, or [`FormError::QuestionnaireNotFound`] if no
    /// questionnaire directory exists for it.
    pub fn with_id(cfg: Arc<CoreConfig>, questionnaire_id: &str) -> FormResult<Self> {
        let questionnaire_id = EntityUuid::parse(questionnaire_id)?;
        let dir = questionnaire_id.sharded_dir(&cfg.questionnaires_dir());
        if !dir.is_dir() {
            return Err(FormError::QuestionnaireNotFound(
                questionnaire_id.to_string(),
            ));
        }
        Ok(Self {
            cfg,
            state: Initialised { questionnaire_id },
        })
    }

    /// Returns the questionnaire identifier.
    pub fn questionnaire_id(&self) -> &EntityUuid {
        &self.state.questionnaire_id
    }

    /// Returns this questionnaire's sharded directory.
    pub(crate) fn dir(&self) -> PathBuf {
        self.state
            .questionnaire_id
            .sharded_dir(&self.cfg.questionnaires_dir())
    }

    /// Reads the questionnaire metadata.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::QuestionnaireNotFound`] if the metadata file is
    /// missing, or a read/deserialisation error otherwise.
    pub fn read(&self) -> FormResult<Questionnaire> {
        let metadata_path = self.dir().join(QUESTIONNAIRE_FILENAME);
        if !metadata_path.is_file() {
            return Err(FormError::QuestionnaireNotFound(
                self.state.questionnaire_id.to_string(),
            ));
        }
        let contents = fs::read_to_string(&metadata_path).map_err(FormError::FileRead)?;
        serde_yaml::from_str(&contents).map_err(FormError::YamlDeserialization)
    }

    /// Applies a partial metadata update and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Propagates read/write/serialisation failures; the title and icon
    /// themselves carry their validation in their types.
    pub fn update(&self, update: QuestionnaireUpdate) -> FormResult<Questionnaire> {
        let mut questionnaire = self.read()?;
        if let Some(title) = update.title {
            questionnaire.title = title;
        }
        if let Some(icon) = update.icon {
            questionnaire.icon = icon;
        }
        questionnaire.updated_at = Utc::now();

        let yaml =
            serde_yaml::to_string(&questionnaire).map_err(FormError::YamlSerialization)?;
        fs::write(self.dir().join(QUESTIONNAIRE_FILENAME), yaml)
            .map_err(FormError::FileWrite)?;
        Ok(questionnaire)
    }

    /// Deletes the questionnaire directory, including its question records.
    pub fn delete(self) -> FormResult<()> {
        fs::remove_dir_all(self.dir()).map_err(FormError::FileDelete)
    }
}

fn write_metadata_and_empty_records(
    dir: &std::path::Path,
    questionnaire: &Questionnaire,
) -> FormResult<()> {
    let yaml = serde_yaml::to_string(questionnaire).map_err(FormError::YamlSerialization)?;
    fs::write(dir.join(QUESTIONNAIRE_FILENAME), yaml).map_err(FormError::FileWrite)?;

    let records = serde_json::to_string_pretty::<Vec<crate::question::Question>>(&Vec::new())
        .map_err(FormError::Serialization)?;
    fs::write(dir.join(crate::constants::QUESTIONS_FILENAME), records)
        .map_err(FormError::FileWrite)?;
    Ok(())
}

/// Iterates the `<s1>/<s2>/<uuid>/` leaf directories under `base`.
fn sharded_leaf_dirs(base: &std::path::Path) -> Vec<PathBuf> {
    let mut leaves = Vec::new();

    let s1_iter = match fs::read_dir(base) {
        Ok(it) => it,
        Err(_) => return leaves,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }
        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };
        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }
            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for id_entry in id_iter.flatten() {
                let id_path = id_entry.path();
                if id_path.is_dir() {
                    leaves.push(id_path);
                }
            }
        }
    }

    leaves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{RegistrationType, Responsible, ResponsibleRole};
    use medforms_types::NonEmptyText;

    fn test_cfg(dir: &std::path::Path) -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(dir.to_path_buf(), "medforms.test.1".into()).unwrap())
    }

    fn new_questionnaire(title: &str) -> NewQuestionnaire {
        NewQuestionnaire {
            title: NonEmptyText::new(title).unwrap(),
            icon: "clipboard".into(),
            user_id: EntityUuid::new(),
            responsibles: vec![Responsible {
                name: NonEmptyText::new("Dr. Alice Example").unwrap(),
                role: ResponsibleRole::Doctor,
                registration_type: RegistrationType::Crm,
                registration_id: NonEmptyText::new("12345").unwrap(),
            }],
        }
    }

    #[test]
    fn initialise_creates_metadata_and_empty_records() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_cfg(tmp.path());

        let service = QuestionnaireService::new(cfg.clone())
            .initialise(new_questionnaire("Admission triage"))
            .unwrap();

        let stored = service.read().unwrap();
        assert_eq!(stored.title.as_str(), "Admission triage");
        assert_eq!(stored.id, *service.questionnaire_id());
        assert!(service.dir().join(crate::constants::QUESTIONS_FILENAME).is_file());
    }

    #[test]
    fn with_id_rejects_non_canonical_and_unknown_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_cfg(tmp.path());

        assert!(matches!(
            QuestionnaireService::with_id(cfg.clone(), "not-a-uuid"),
            Err(FormError::InvalidInput(_))
        ));
        assert!(matches!(
            QuestionnaireService::with_id(cfg, &EntityUuid::new().to_string()),
            Err(FormError::QuestionnaireNotFound(_))
        ));
    }

    #[test]
    fn list_returns_created_questionnaires_oldest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_cfg(tmp.path());

        QuestionnaireService::new(cfg.clone())
            .initialise(new_questionnaire("First"))
            .unwrap();
        QuestionnaireService::new(cfg.clone())
            .initialise(new_questionnaire("Second"))
            .unwrap();

        let listed = QuestionnaireService::new(cfg).list();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at <= listed[1].created_at);
    }

    #[test]
    fn list_skips_unparsable_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_cfg(tmp.path());

        let service = QuestionnaireService::new(cfg.clone())
            .initialise(new_questionnaire("Valid"))
            .unwrap();
        let broken = QuestionnaireService::new(cfg.clone())
            .initialise(new_questionnaire("Broken"))
            .unwrap();
        fs::write(broken.dir().join(QUESTIONNAIRE_FILENAME), ": not yaml [").unwrap();

        let listed = QuestionnaireService::new(cfg).list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, *service.questionnaire_id());
    }

    #[test]
    fn update_changes_title_and_bumps_updated_at() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_cfg(tmp.path());

        let service = QuestionnaireService::new(cfg)
            .initialise(new_questionnaire("Old title"))
            .unwrap();
        let before = service.read().unwrap();

        let updated = service
            .update(QuestionnaireUpdate {
                title: Some(NonEmptyText::new("New title").unwrap()),
                icon: None,
            })
            .unwrap();
        assert_eq!(updated.title.as_str(), "New title");
        assert_eq!(updated.icon, before.icon);
        assert!(updated.updated_at >= before.updated_at);
    }

    #[test]
    fn delete_removes_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = test_cfg(tmp.path());

        let service = QuestionnaireService::new(cfg.clone())
            .initialise(new_questionnaire("Ephemeral"))
            .unwrap();
        let id = service.questionnaire_id().to_string();
        let dir = service.dir();
        service.delete().unwrap();

        assert!(!dir.exists());
        assert!(QuestionnaireService::with_id(cfg, &id).is_err());
    }
}
