use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::entity::{Note, NoteMap, SHORT_ID_LEN};
use crate::error::{Result, SnotesError};
use crate::search::sort_by_recency;

pub const NOTES_FILE: &str = "notes.json";

/// What was found on disk when loading the notes file.
#[derive(Debug)]
pub enum LoadOutcome {
    /// No file yet. First run.
    Empty,
    Loaded(NoteMap),
    /// The file exists but could not be read as a note collection.
    Corrupt(SnotesError),
}

/// JSON-backed note collection.
///
/// Every change rewrites the whole file. The in-memory map is the source of
/// truth for the running process; a failed write leaves it untouched so the
/// caller can retry.
pub struct NoteStore {
    notes: NoteMap,
    path: PathBuf,
}

impl NoteStore {
    /// Read the notes file at `path` without side effects.
    pub fn load(path: &Path) -> LoadOutcome {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return LoadOutcome::Empty,
            Err(e) => {
                return LoadOutcome::Corrupt(SnotesError::CorruptStore {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        match parse_notes(&raw) {
            Ok(notes) => LoadOutcome::Loaded(notes),
            Err(reason) => LoadOutcome::Corrupt(SnotesError::CorruptStore {
                path: path.to_path_buf(),
                reason,
            }),
        }
    }

    /// Open the store at `path`, recovering from an unreadable file.
    ///
    /// A corrupt file is moved aside and the store starts empty. The returned
    /// notice, if any, is meant to be shown to the user.
    pub fn open(path: &Path) -> (Self, Option<String>) {
        let (notes, notice) = match Self::load(path) {
            LoadOutcome::Empty => {
                tracing::debug!(path = %path.display(), "no notes file yet, starting empty");
                (NoteMap::new(), None)
            }
            LoadOutcome::Loaded(notes) => {
                tracing::debug!(path = %path.display(), count = notes.len(), "loaded notes");
                (notes, None)
            }
            LoadOutcome::Corrupt(err) => {
                tracing::warn!(error = %err, "notes file is corrupt, starting empty");
                let notice = match quarantine(path) {
                    Ok(backup) => format!(
                        "{}. The file was moved to {} and a new notebook was started.",
                        err,
                        backup.display()
                    ),
                    Err(e) => {
                        tracing::error!(error = %e, "could not move corrupt notes file aside");
                        format!(
                            "{}. It could not be backed up ({}); saving will overwrite it.",
                            err, e
                        )
                    }
                };
                (NoteMap::new(), Some(notice))
            }
        };

        let store = Self {
            notes,
            path: path.to_path_buf(),
        };
        (store, notice)
    }

    /// Open `notes.json` inside `dir`.
    pub fn open_in(dir: &Path) -> (Self, Option<String>) {
        Self::open(&dir.join(NOTES_FILE))
    }

    /// Write the full collection to disk.
    pub fn save(&self) -> Result<()> {
        write_notes(&self.path, &self.notes)
    }

    /// Stamp `note` as updated, merge it into the collection and persist.
    ///
    /// On a write failure the merged note stays in memory.
    pub fn upsert(&mut self, mut note: Note) -> Result<Note> {
        let now = Utc::now();
        note.updated_at = if now > note.created_at { now } else { note.created_at };
        self.notes.insert(note.id, note.clone());
        self.save()?;
        tracing::debug!(id = %note.id, "saved note");
        Ok(note)
    }

    /// Remove a note and persist. Returns `false` if no such note existed.
    pub fn delete(&mut self, id: &Uuid) -> Result<bool> {
        if self.notes.remove(id).is_none() {
            return Ok(false);
        }
        self.save()?;
        tracing::debug!(id = %id, "deleted note");
        Ok(true)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.notes.contains_key(id)
    }

    pub fn notes(&self) -> &NoteMap {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find a note by full id, unique id prefix, or 1-based listing position.
    ///
    /// Numbers shorter than a listed short id are positions; longer digit
    /// runs are id prefixes.
    pub fn resolve(&self, key: &str) -> Result<&Note> {
        let key = key.trim();

        if let Ok(id) = Uuid::parse_str(key) {
            return self
                .notes
                .get(&id)
                .ok_or_else(|| SnotesError::NoteNotFound(key.to_string()));
        }

        if let Some(position) = parse_position(key) {
            return position
                .checked_sub(1)
                .and_then(|idx| sort_by_recency(&self.notes).get(idx).copied())
                .ok_or_else(|| SnotesError::NoteNotFound(key.to_string()));
        }

        let prefix = key.to_lowercase();
        let mut matches = self
            .notes
            .values()
            .filter(|n| !prefix.is_empty() && n.id.to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(note), None) => Ok(note),
            (Some(_), Some(_)) => Err(SnotesError::AmbiguousId(key.to_string())),
            _ => Err(SnotesError::NoteNotFound(key.to_string())),
        }
    }
}

/// Read `key` as a 1-based listing position if it is too short to be a
/// listed short id.
pub fn parse_position(key: &str) -> Option<usize> {
    if key.len() >= SHORT_ID_LEN {
        return None;
    }
    key.parse().ok()
}

/// Parse the notes file contents, checking that every key matches its note.
fn parse_notes(raw: &str) -> std::result::Result<NoteMap, String> {
    let notes: NoteMap = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    for (key, note) in &notes {
        if *key != note.id {
            return Err(format!("entry {} holds a note with id {}", key, note.id));
        }
    }
    Ok(notes)
}

/// Serialize `notes` and replace the file at `path` atomically.
pub fn write_notes(path: &Path, notes: &NoteMap) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(notes)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

/// Write to a temporary file beside `path`, sync it, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let failure = |source: std::io::Error| SnotesError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(failure)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(failure)?;
    tmp.write_all(bytes).map_err(failure)?;
    tmp.as_file().sync_all().map_err(failure)?;
    tmp.persist(path).map_err(|e| failure(e.error))?;
    Ok(())
}

/// Move an unreadable notes file aside. Returns the backup path.
fn quarantine(path: &Path) -> std::io::Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| NOTES_FILE.to_string());
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let backup = path.with_file_name(format!("{}.corrupt-{}", file_name, stamp));

    fs::rename(path, &backup)?;
    tracing::info!(backup = %backup.display(), "quarantined corrupt notes file");
    Ok(backup)
}
