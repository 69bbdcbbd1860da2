//! Storage modules.
//!
//! This module contains the stores for questionnaire metadata and the flat
//! question records each questionnaire owns.

pub mod helpers;
pub mod questionnaires;
pub mod questions;
