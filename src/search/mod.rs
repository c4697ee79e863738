//! In-memory note search and listing order.
//!
//! Search never touches the disk: it filters whatever collection the caller
//! already holds.

use std::cmp::Ordering;

use crate::entity::{Note, NoteMap};

/// Listing order: most recently updated first, ties broken by id.
pub fn recency_order(a: &Note, b: &Note) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// All notes in listing order.
pub fn sort_by_recency(notes: &NoteMap) -> Vec<&Note> {
    let mut sorted: Vec<&Note> = notes.values().collect();
    sorted.sort_by(|a, b| recency_order(a, b));
    sorted
}

/// The note a fresh session should open when nothing else is selected.
pub fn most_recent(notes: &NoteMap) -> Option<&Note> {
    notes.values().min_by(|a, b| recency_order(a, b))
}

/// Case-insensitive substring search over note content.
///
/// An empty (or whitespace-only) query matches every note. Results come back
/// in listing order.
pub fn search<'a>(notes: &'a NoteMap, query: &str) -> Vec<&'a Note> {
    let needle = query.trim().to_lowercase();
    let mut results: Vec<&Note> = notes
        .values()
        .filter(|note| needle.is_empty() || note.content.to_lowercase().contains(&needle))
        .collect();
    results.sort_by(|a, b| recency_order(a, b));
    results
}
