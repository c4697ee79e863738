//! Editing session: the selected note, its working copy, the search query
//! and the auto-save timer.
//!
//! Front ends drive a [`Session`] with explicit timestamps, so the
//! auto-save behavior can be exercised without a real clock.

mod debounce;

use std::path::PathBuf;
use std::time::Instant;

use uuid::Uuid;

pub use debounce::Debouncer;

use crate::config::AppConfig;
use crate::entity::{Note, NoteStats};
use crate::error::{Result, SnotesError};
use crate::search::{most_recent, search};
use crate::storage::NoteStore;

/// What happened when the session tried to persist the current note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveReport {
    Saved(Note),
    /// The note was emptied (or deleted) and is no longer stored.
    Removed(Uuid),
    /// Nothing to write.
    Unchanged,
    /// The write failed; the edit is still held in memory.
    Failed(String),
}

pub struct Session {
    store: NoteStore,
    config: AppConfig,
    config_dir: PathBuf,
    current: Note,
    query: String,
    autosave: Debouncer<Uuid>,
    write_pending: bool,
}

impl Session {
    /// Start a session on the last selected note, else the most recent one,
    /// else a fresh draft.
    pub fn start(store: NoteStore, config: AppConfig, config_dir: PathBuf) -> Self {
        let current = config
            .last_note_id
            .and_then(|id| store.get(&id).cloned())
            .or_else(|| most_recent(store.notes()).cloned())
            .unwrap_or_else(|| Note::new(""));
        let autosave = Debouncer::new(config.autosave_delay());

        tracing::debug!(id = %current.id, notes = store.len(), "session started");
        Self {
            store,
            config,
            config_dir,
            current,
            query: String::new(),
            autosave,
            write_pending: false,
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn current(&self) -> &Note {
        &self.current
    }

    pub fn buffer(&self) -> &str {
        &self.current.content
    }

    pub fn title(&self) -> String {
        self.current.title()
    }

    pub fn stats(&self) -> NoteStats {
        NoteStats::of(&self.current.content)
    }

    /// True while the current note has never been written to the store.
    pub fn is_draft(&self) -> bool {
        !self.store.contains(&self.current.id)
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave.pending().is_some()
    }

    /// Deadline of the pending auto-save, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    /// True when an earlier write failed and has not been retried successfully.
    pub fn has_unwritten_changes(&self) -> bool {
        self.write_pending
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Stored notes matching the current query, in listing order.
    pub fn visible_notes(&self) -> Vec<&Note> {
        search(self.store.notes(), &self.query)
    }

    /// Replace the working copy and schedule an auto-save.
    pub fn edit(&mut self, content: impl Into<String>, now: Instant) {
        self.current.content = content.into();
        if let Some(other) = self.autosave.schedule(self.current.id, now) {
            tracing::warn!(id = %other, "dropped auto-save for a note that is no longer selected");
        }
    }

    /// Append a line of text to the working copy.
    pub fn append_line(&mut self, line: &str, now: Instant) {
        let mut content = std::mem::take(&mut self.current.content);
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(line);
        self.edit(content, now);
    }

    /// Run the auto-save if its quiet period has elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<SaveReport> {
        match self.autosave.take_due(now) {
            Some(id) if id == self.current.id => Some(self.flush()),
            Some(id) => {
                tracing::warn!(id = %id, "auto-save fired for a note that is not selected");
                None
            }
            None => None,
        }
    }

    /// Save the working copy now, cancelling any pending auto-save.
    ///
    /// Empty notes are removed rather than stored. A failed write is kept in
    /// memory and retried on the next flush.
    pub fn flush(&mut self) -> SaveReport {
        self.autosave.cancel();
        let id = self.current.id;
        let content = self.current.content.trim_end().to_string();

        let outcome = if content.trim().is_empty() {
            if self.store.contains(&id) {
                self.store.delete(&id).map(|_| SaveReport::Removed(id))
            } else if self.write_pending {
                self.store.save().map(|_| SaveReport::Unchanged)
            } else {
                return SaveReport::Unchanged;
            }
        } else {
            let stored = self
                .store
                .get(&id)
                .filter(|stored| stored.content == content)
                .cloned();
            match stored {
                Some(_) if !self.write_pending => return SaveReport::Unchanged,
                // Retry the earlier failed write without restamping this note.
                Some(note) => self.store.save().map(|_| SaveReport::Saved(note)),
                None => {
                    let mut note = self.current.clone();
                    note.content = content;
                    self.store.upsert(note).map(SaveReport::Saved)
                }
            }
        };

        match outcome {
            Ok(report) => {
                self.write_pending = false;
                if let SaveReport::Saved(ref note) = report {
                    self.current = note.clone();
                }
                report
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "save failed, keeping edit in memory");
                self.write_pending = true;
                SaveReport::Failed(e.to_string())
            }
        }
    }

    /// Switch to another stored note, saving the current one first.
    pub fn select(&mut self, id: Uuid) -> Result<SaveReport> {
        let target = self
            .store
            .get(&id)
            .cloned()
            .ok_or_else(|| SnotesError::NoteNotFound(id.to_string()))?;
        if target.id == self.current.id {
            return Ok(SaveReport::Unchanged);
        }

        let report = self.flush();
        self.current = target;
        self.remember_selection();
        Ok(report)
    }

    /// Switch to the note named by `key` (id, id prefix or listing position).
    pub fn select_key(&mut self, key: &str) -> Result<SaveReport> {
        let id = self.store.resolve(key)?.id;
        self.select(id)
    }

    /// Save the current note and start an empty draft.
    pub fn new_note(&mut self) -> SaveReport {
        let report = self.flush();
        self.current = Note::new("");
        tracing::debug!(id = %self.current.id, "new draft");
        report
    }

    /// Delete the current note right away and move to the most recent one.
    pub fn delete_current(&mut self) -> SaveReport {
        self.autosave.cancel();
        let id = self.current.id;

        let report = match self.store.delete(&id) {
            Ok(true) => SaveReport::Removed(id),
            Ok(false) => SaveReport::Unchanged,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "delete was not written to disk");
                self.write_pending = true;
                SaveReport::Failed(e.to_string())
            }
        };

        self.current = most_recent(self.store.notes())
            .cloned()
            .unwrap_or_else(|| Note::new(""));
        report
    }

    /// Flush the current note and remember it for the next session.
    pub fn close(&mut self) -> SaveReport {
        let report = self.flush();
        self.remember_selection();
        tracing::debug!("session closed");
        report
    }

    /// Record the selected note in the config file. Failures are only logged.
    fn remember_selection(&mut self) {
        self.config.last_note_id = Some(self.current.id).filter(|id| self.store.contains(id));
        if let Err(e) = self.config.save(&self.config_dir) {
            tracing::warn!(error = %e, "could not save config");
        }
    }
}
