//! Store-related utilities.

use crate::uuid::EntityUuid;
use crate::{FormError, FormResult};
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Creates a unique sharded directory within the base questionnaires directory.
///
/// Generates identifiers with the provided source function and attempts to
/// create the corresponding sharded directory, retrying up to 5 times to guard
/// against identifier collisions or pre-existing directories.
///
/// # Errors
///
/// Returns [`FormError::QuestionnaireDirCreation`] if:
/// - directory creation fails after 5 attempts,
/// - parent directory creation fails.
pub(crate) fn create_unique_sharded_dir(
    base_dir: &Path,
    mut uuid_source: impl FnMut() -> EntityUuid,
) -> FormResult<(EntityUuid, PathBuf)> {
    for _attempt in 0..5 {
        let uuid = uuid_source();
        let candidate = uuid.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(FormError::QuestionnaireDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((uuid, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(FormError::QuestionnaireDirCreation(e)),
        }
    }

    Err(FormError::QuestionnaireDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique questionnaire directory after 5 attempts",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sharded_directory() {
        let base = tempfile::tempdir().unwrap();
        let (uuid, dir) = create_unique_sharded_dir(base.path(), EntityUuid::new).unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with(uuid.to_string()));
    }

    #[test]
    fn retries_past_an_existing_directory() {
        let base = tempfile::tempdir().unwrap();
        let taken = EntityUuid::new();
        fs::create_dir_all(taken.sharded_dir(base.path())).unwrap();

        let mut ids = vec![EntityUuid::new(), taken.clone()];
        let (allocated, _) =
            create_unique_sharded_dir(base.path(), || ids.pop().unwrap()).unwrap();
        assert_ne!(allocated, taken);
    }

    #[test]
    fn gives_up_after_repeated_collisions() {
        let base = tempfile::tempdir().unwrap();
        let taken = EntityUuid::new();
        fs::create_dir_all(taken.sharded_dir(base.path())).unwrap();

        let result = create_unique_sharded_dir(base.path(), || taken.clone());
        assert!(result.is_err());
    }
}
