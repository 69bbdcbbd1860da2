//! Conditional visibility evaluation for form fill.
//!
//! A child question gated by a `trigger_value` is shown only when its parent
//! is shown *and* the answer recorded for the parent matches the trigger.
//! Visibility therefore depends solely on a node's ancestors, so one top-down
//! pass over the organized forest evaluates the whole questionnaire in O(n).

use crate::hierarchy::QuestionTreeNode;
use crate::uuid::EntityUuid;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An answer recorded for a single question during form fill.
///
/// Multi-select questions (`checkbox`) record every selected value; everything
/// else records one value. Trigger matching follows the shape: a multi-valued
/// answer matches a trigger by containment, a single value by exact string
/// equality.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerValue {
    /// Whether this answer satisfies `trigger`.
    pub fn matches(&self, trigger: &str) -> bool {
        match self {
            Self::Single(value) => value == trigger,
            Self::Multiple(values) => values.iter().any(|value| value == trigger),
        }
    }
}

/// Answers recorded so far, keyed by question id.
pub type RecordedAnswers = HashMap<EntityUuid, AnswerValue>;

/// Computes the set of visible question ids for the given answers.
///
/// Roots are always visible. A child with no trigger is visible exactly when
/// its parent is; a triggered child additionally requires a matching recorded
/// answer for the parent. Subtrees beneath an invisible node are never
/// descended into, so their gating is irrelevant — they are hidden wholesale.
pub fn visible_set(roots: &[QuestionTreeNode], answers: &RecordedAnswers) -> HashSet<EntityUuid> {
    let mut visible = HashSet::new();
    let mut stack: Vec<&QuestionTreeNode> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        visible.insert(node.question.id.clone());
        for child in &node.child_questions {
            let shown = match child.question.trigger_value.as_deref() {
                None => true,
                Some(trigger) => answers
                    .get(&node.question.id)
                    .is_some_and(|answer| answer.matches(trigger)),
            };
            if shown {
                stack.push(child);
            }
        }
    }
    visible
}

/// Whether the question with `id` should be presented, given `answers`.
///
/// Returns `false` for ids not present in the forest.
pub fn is_visible(roots: &[QuestionTreeNode], id: &EntityUuid, answers: &RecordedAnswers) -> bool {
    visible_set(roots, answers).contains(id)
}
