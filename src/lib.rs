pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod search;
pub mod session;
pub mod storage;

pub use entity::{derive_title, Note, NoteMap};
pub use error::{Result, SnotesError};
pub use search::search;
pub use session::Session;
pub use storage::{LoadOutcome, NoteStore};
