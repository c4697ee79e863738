use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnotesError {
    #[error("Could not locate a home directory. Set SNOTES_DIR to choose where notes are kept.")]
    NoDataDir,

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Refusing to save an empty note")]
    EmptyNote,

    #[error("Ambiguous note id '{0}'. Use more characters.")]
    AmbiguousId(String),

    #[error("Notes file {} is unreadable: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SnotesError>;
