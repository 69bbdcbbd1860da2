//! UUID validation and sharded-path utilities.
//!
//! Every entity identifier in medforms (questionnaires, questions, users) is a
//! UUID in RFC 4122 canonical textual form: **36 characters, lowercase hex,
//! hyphenated** (e.g. `550e8400-e29b-41d4-a716-446655440000`).
//!
//! Externally supplied identifiers are validated *before* any storage path is
//! derived or any lookup is attempted; a malformed identifier never reaches
//! the filesystem layer. [`EntityUuid`] is the wrapper that guarantees the
//! canonical form once constructed.
//!
//! ## Sharded directory layout
//!
//! Questionnaire data lives under directories derived from the identifier's
//! hex digits (hyphens excluded):
//!
//! `parent_dir/<hex[0..2]>/<hex[2..4]>/<canonical-uuid>/`
//!
//! e.g. `form_data/questionnaires/55/0e/550e8400-e29b-41d4-a716-446655440000/`
//!
//! Sharding keeps individual directories small when a deployment accumulates
//! many questionnaires.

use crate::error::{FormError, FormResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

pub(crate) use ::uuid::Uuid;

/// An entity identifier guaranteed to be in RFC 4122 canonical textual form.
///
/// Use this wrapper whenever an identifier crosses into the core from outside
/// (CLI argument, API path segment, request body) and whenever a sharded
/// storage path must be derived.
///
/// # Construction
/// - [`EntityUuid::new`] allocates a fresh v4 identifier for new records.
/// - [`EntityUuid::parse`] validates an externally supplied string.
///
/// Non-canonical inputs (uppercase, unhyphenated, braced, URN-prefixed) are
/// rejected rather than normalised, so the textual form stored on disk and
/// echoed over the API is always identical to the validated input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityUuid(Uuid);

impl EntityUuid {
    /// Allocates a new random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and wraps an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidInput`] if `input` is not a lowercase
    /// hyphenated RFC 4122 textual UUID.
    pub fn parse(input: &str) -> FormResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees a well-formed hyphenated UUID
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(FormError::InvalidInput(format!(
            "identifier must be a lowercase hyphenated UUID, got: '{}'",
            input
        )))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical RFC 4122 textual form.
    ///
    /// Purely syntactic: 36 bytes, hyphens at positions 8, 13, 18 and 23,
    /// lowercase hex everywhere else.
    pub fn is_canonical(input: &str) -> bool {
        if input.len() != 36 {
            return false;
        }
        input.bytes().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
        })
    }

    /// Returns `parent_dir/<s1>/<s2>/<canonical>/` for this identifier.
    ///
    /// `s1` and `s2` are the first four hex digits of the identifier
    /// (hyphens excluded); the canonical hyphenated form names the leaf
    /// directory.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let hex = self.0.simple().to_string();
        let s1 = &hex[0..2];
        let s2 = &hex[2..4];
        parent_dir.join(s1).join(s2).join(self.0.hyphenated().to_string())
    }
}

impl Default for EntityUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EntityUuid {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityUuid::parse(s)
    }
}

impl serde::Serialize for EntityUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0.hyphenated())
    }
}

impl<'de> serde::Deserialize<'de> for EntityUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EntityUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn new_generates_canonical_identifier() {
        let id = EntityUuid::new();
        assert!(EntityUuid::is_canonical(&id.to_string()));
    }

    #[test]
    fn parse_accepts_canonical_form() {
        let id = EntityUuid::parse(CANONICAL).unwrap();
        assert_eq!(id.to_string(), CANONICAL);
    }

    #[test]
    fn parse_rejects_unhyphenated_form() {
        assert!(EntityUuid::parse("550e8400e29b41d4a716446655440000").is_err());
    }

    #[test]
    fn parse_rejects_uppercase() {
        assert!(EntityUuid::parse("550E8400-E29B-41D4-A716-446655440000").is_err());
    }

    #[test]
    fn parse_rejects_braced_and_urn_forms() {
        assert!(EntityUuid::parse("{550e8400-e29b-41d4-a716-446655440000}").is_err());
        assert!(EntityUuid::parse("urn:uuid:550e8400-e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn parse_rejects_wrong_length_and_bad_characters() {
        assert!(EntityUuid::parse("").is_err());
        assert!(EntityUuid::parse("550e8400-e29b-41d4-a716-44665544000").is_err());
        assert!(EntityUuid::parse("550e8400-e29b-41d4-a716-4466554400zz").is_err());
        // Hyphens in the wrong positions
        assert!(EntityUuid::parse("550e84-00e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn parse_error_mentions_expected_format() {
        match EntityUuid::parse("not-a-uuid") {
            Err(FormError::InvalidInput(msg)) => {
                assert!(msg.contains("lowercase hyphenated UUID"));
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn sharded_dir_uses_leading_hex_digits() {
        let id = EntityUuid::parse(CANONICAL).unwrap();
        let dir = id.sharded_dir(Path::new("/form_data/questionnaires"));
        assert_eq!(
            dir,
            PathBuf::from(format!("/form_data/questionnaires/55/0e/{CANONICAL}"))
        );
    }

    #[test]
    fn serde_round_trip() {
        let id = EntityUuid::parse(CANONICAL).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{CANONICAL}\""));
        let back: EntityUuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialising_non_canonical_fails() {
        let result: Result<EntityUuid, _> =
            serde_json::from_str("\"550e8400e29b41d4a716446655440000\"");
        assert!(result.is_err());
    }

    #[test]
    fn round_trip_new_to_string_to_parse() {
        let original = EntityUuid::new();
        let parsed = EntityUuid::parse(&original.to_string()).unwrap();
        assert_eq!(original, parsed);
    }
}
