mod note;
mod title;

use std::collections::BTreeMap;

use uuid::Uuid;

pub use note::{Note, SHORT_ID_LEN};
pub use title::{derive_title, NoteStats, TITLE_MAX_CHARS, UNTITLED};

/// The full note collection, keyed by id.
///
/// A `BTreeMap` keeps serialization order stable so that writing the same
/// collection twice produces identical bytes.
pub type NoteMap = BTreeMap<Uuid, Note>;
