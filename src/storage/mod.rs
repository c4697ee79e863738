mod json_store;

pub(crate) use json_store::write_atomic;
pub use json_store::{parse_position, write_notes, LoadOutcome, NoteStore, NOTES_FILE};
