//! Shared validated value types for medforms.
//!
//! These wrappers exist so that "a question prompt is never blank" and similar
//! rules are enforced at construction time rather than re-checked at every use
//! site.

use serde::{Deserialize, Serialize};

/// Errors raised when constructing validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input was empty or contained only whitespace.
    #[error("text cannot be empty")]
    Empty,
}

/// A trimmed, guaranteed non-empty string.
///
/// Used for question prompts, option labels and values, and questionnaire
/// titles. Construction trims surrounding whitespace and rejects inputs that
/// are empty afterwards, so holders of a `NonEmptyText` never need to
/// re-validate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Validates and wraps `input`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NonEmptyText::new(&value)
    }
}

impl From<NonEmptyText> for String {
    fn from(value: NonEmptyText) -> Self {
        value.0
    }
}

impl std::str::FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NonEmptyText::new(s)
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_text() {
        let text = NonEmptyText::new("Do you smoke?").unwrap();
        assert_eq!(text.as_str(), "Do you smoke?");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let text = NonEmptyText::new("  yes  ").unwrap();
        assert_eq!(text.as_str(), "yes");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(NonEmptyText::new("").is_err());
    }

    #[test]
    fn rejects_whitespace_only_input() {
        assert!(NonEmptyText::new(" \t\n ").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let text = NonEmptyText::new("Blood pressure").unwrap();
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, "\"Blood pressure\"");
        let back: NonEmptyText = serde_json::from_str(&json).unwrap();
        assert_eq!(back, text);
    }

    #[test]
    fn deserialising_blank_text_fails() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"   \"");
        assert!(result.is_err());
    }
}
