//! Organising flat question records into an ordered forest.
//!
//! Question records are persisted flat, with tree structure expressed only as
//! back-references (`parent_question_id`). [`organize`] rebuilds the forest a
//! rendering layer needs: roots and every sibling list sorted by ascending
//! `order_index`, ties kept in input order.
//!
//! The functions here are pure and deterministic. Structural anomalies in the
//! data (dangling parent references, duplicate identifiers, cyclic chains)
//! are data conditions, not errors — they degrade per the policies documented
//! on [`organize`] and never panic or drop records.

use crate::question::Question;
use crate::uuid::EntityUuid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A question together with its recursively organized children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionTreeNode {
    #[serde(flatten)]
    pub question: Question,
    #[serde(rename = "childQuestions")]
    pub child_questions: Vec<QuestionTreeNode>,
}

/// Organises a flat list of question records into an ordered forest.
///
/// The input is expected to be pre-filtered to a single questionnaire; this
/// function does not filter by `questionnaire_id` itself.
///
/// Policies for anomalous data:
/// - **Duplicate ids**: the first record wins; later records with the same id
///   are ignored, keeping the result independent of how duplicates arrived.
/// - **Dangling or missing parent**: the record is promoted to a root, never
///   dropped and never an error.
/// - **Self-references and cyclic chains**: the first-encountered member of a
///   cycle is promoted to a root, which turns the rest of the cycle into an
///   ordinary chain beneath it.
///
/// Every level (the root list and each `child_questions` list) is sorted by
/// ascending `order_index` with a stable sort, so equal indices keep the
/// relative order of the input. Construction uses explicit work stacks
/// throughout; a chain thousands of levels deep cannot overflow the call
/// stack.
pub fn organize(questions: &[Question]) -> Vec<QuestionTreeNode> {
    // First-seen-wins lookup of id -> record index.
    let mut index_by_id: HashMap<&EntityUuid, usize> = HashMap::new();
    let mut records: Vec<&Question> = Vec::new();
    for question in questions {
        if !index_by_id.contains_key(&question.id) {
            index_by_id.insert(&question.id, records.len());
            records.push(question);
        }
    }

    // Resolve parent links; unresolvable parents and self-references become
    // roots immediately.
    let mut parent: Vec<Option<usize>> = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let resolved = record
            .parent_question_id
            .as_ref()
            .and_then(|pid| index_by_id.get(pid).copied())
            .filter(|&parent_idx| parent_idx != idx);
        parent.push(resolved);
    }

    // Neutralise cyclic chains: a record whose ancestor walk leads back to
    // itself is promoted to a root. Walks are bounded so a record pointing
    // *into* a not-yet-broken cycle terminates too.
    for idx in 0..records.len() {
        let mut cursor = parent[idx];
        let mut steps = 0usize;
        while let Some(ancestor) = cursor {
            if ancestor == idx {
                parent[idx] = None;
                break;
            }
            steps += 1;
            if steps > records.len() {
                break;
            }
            cursor = parent[ancestor];
        }
    }

    // Group children in input order, then sort each group. Vec::sort_by_key
    // is stable, so equal order indices keep their input order.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (idx, &parent_idx) in parent.iter().enumerate() {
        match parent_idx {
            Some(parent_idx) => children[parent_idx].push(idx),
            None => roots.push(idx),
        }
    }
    roots.sort_by_key(|&idx| records[idx].order_index);
    for group in &mut children {
        group.sort_by_key(|&idx| records[idx].order_index);
    }

    // Record a preorder of the forest, then attach children walking it in
    // reverse: every record is then visited after all of its descendants.
    let mut preorder: Vec<usize> = Vec::with_capacity(records.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(idx) = stack.pop() {
        preorder.push(idx);
        stack.extend(children[idx].iter().rev().copied());
    }

    let mut built: Vec<Option<QuestionTreeNode>> = records
        .iter()
        .map(|&record| {
            Some(QuestionTreeNode {
                question: record.clone(),
                child_questions: Vec::new(),
            })
        })
        .collect();

    for &idx in preorder.iter().rev() {
        let attached = children[idx]
            .iter()
            .map(|&child| built[child].take().expect("child attached exactly once"))
            .collect();
        if let Some(node) = built[idx].as_mut() {
            node.child_questions = attached;
        }
    }

    roots
        .iter()
        .map(|&idx| built[idx].take().expect("root taken exactly once"))
        .collect()
}

/// Flattens an organized forest back into a record list, in document order.
///
/// Since parent references live on the records themselves, flattening then
/// re-organising reproduces the same forest (see the idempotence test below).
pub fn flatten(roots: &[QuestionTreeNode]) -> Vec<Question> {
    let mut flat = Vec::new();
    let mut stack: Vec<&QuestionTreeNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        flat.push(node.question.clone());
        stack.extend(node.child_questions.iter().rev());
    }
    flat
}

/// Returns the next `order_index` for a sibling group.
///
/// Strictly greater than every existing index in the group, or `1` for an
/// empty group. Callers must pass the *organized* sibling group at the target
/// parent (or the root list), not the whole flat list — see [`sibling_group`].
pub fn next_order_index(siblings: &[QuestionTreeNode]) -> i32 {
    siblings
        .iter()
        .map(|node| node.question.order_index)
        .max()
        .map_or(1, |max| max + 1)
}

/// Finds the node with the given id anywhere in the forest.
pub fn find_node<'a>(
    roots: &'a [QuestionTreeNode],
    id: &EntityUuid,
) -> Option<&'a QuestionTreeNode> {
    let mut stack: Vec<&QuestionTreeNode> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if &node.question.id == id {
            return Some(node);
        }
        stack.extend(node.child_questions.iter());
    }
    None
}

/// Returns the sibling group under `parent_id`, or the root list for `None`.
///
/// An unresolvable parent id yields an empty group.
pub fn sibling_group<'a>(
    roots: &'a [QuestionTreeNode],
    parent_id: Option<&EntityUuid>,
) -> &'a [QuestionTreeNode] {
    match parent_id {
        None => roots,
        Some(id) => find_node(roots, id)
            .map(|node| node.child_questions.as_slice())
            .unwrap_or(&[]),
    }
}
