//! Line-oriented interactive shell.
//!
//! Plain lines are appended to the selected note. Lines starting with `:`
//! are commands; `::` escapes a literal leading colon. The event loop races
//! input against the auto-save deadline and a shutdown signal.

use std::future::Future;
use std::io::Write;
use std::time::Instant;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::Result;
use crate::session::{SaveReport, Session};
use crate::storage::parse_position;

const HELP: &str = "\
Type to add lines to the current note. Commands:
  :new              start a new note
  :list             list notes (filtered by the active search)
  :open <n|id>      switch to a note by list number or id
  :search [text]    filter the list; no text clears the filter
  :show             print the current note
  :clear            empty the current note
  :save             save now
  :delete           delete the current note (asks for :yes)
  :stats            word and character counts
  :help             this text
  :quit             save and exit
A line starting with '::' adds a line beginning with ':'.";

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Shell state that is not part of the editing session.
#[derive(Debug, Default)]
struct ShellState {
    confirm_delete: bool,
}

/// Current time on the runtime clock, so paused test time drives auto-save.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

/// Run the shell until `:quit`, end of input, or `shutdown` resolves.
///
/// The session is closed (flushed, selection remembered) on every exit path,
/// including an I/O error on either stream. That error is returned afterwards.
pub async fn run_shell<R, W, S>(
    session: &mut Session,
    input: R,
    out: &mut W,
    shutdown: S,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    let outcome = event_loop(session, input, out, shutdown).await;
    if let Err(e) = &outcome {
        tracing::warn!(error = %e, "shell stopped early, saving before exit");
    }

    let closing = match session.close() {
        SaveReport::Failed(reason) => {
            writeln!(out, "Warning: your last changes could not be saved: {}", reason)
        }
        _ => Ok(()),
    }
    .and_then(|_| out.flush());

    outcome?;
    closing?;
    Ok(())
}

async fn event_loop<R, W, S>(
    session: &mut Session,
    mut input: R,
    out: &mut W,
    shutdown: S,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut state = ShellState::default();
    // Survives a cancelled read, so a partial line is never lost.
    let mut raw = Vec::new();

    writeln!(out, "snotes: {} notes. Type :help for commands.", session.store().len())?;
    show_current(session, out)?;

    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            // Input first, so typed lines are never dropped in favor of shutdown.
            biased;
            read = input.read_until(b'\n', &mut raw) => {
                if read? == 0 && raw.is_empty() {
                    break;
                }
                let line = decode_line(&raw);
                raw.clear();
                if handle_line(session, &mut state, &line, out)? == Flow::Quit {
                    break;
                }
            }
            _ = wait_until(deadline) => {
                if let Some(report) = session.tick(now()) {
                    report_autosave(session, report, out)?;
                }
            }
            _ = &mut shutdown => {
                writeln!(out)?;
                break;
            }
        }
        out.flush()?;
    }

    Ok(())
}

/// Strip the line ending and decode, replacing bytes that are not UTF-8.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(line) => line.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "input line is not valid UTF-8, replacing bad bytes");
            String::from_utf8_lossy(raw).into_owned()
        }
    }
}

fn handle_line<W: Write>(
    session: &mut Session,
    state: &mut ShellState,
    line: &str,
    out: &mut W,
) -> Result<Flow> {
    let Some(command) = line.strip_prefix(':').filter(|rest| !rest.starts_with(':')) else {
        state.confirm_delete = false;
        let text = line.strip_prefix(':').unwrap_or(line);
        session.append_line(text, now());
        return Ok(Flow::Continue);
    };

    let (name, arg) = match command.trim().split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };

    if std::mem::take(&mut state.confirm_delete) {
        if name == "yes" {
            let title = session.title();
            let report = session.delete_current();
            match report {
                SaveReport::Failed(reason) => writeln!(
                    out,
                    "Warning: deleted '{}' but could not write the change: {}",
                    title, reason
                )?,
                _ => writeln!(out, "Note deleted: {}", title)?,
            }
            show_current(session, out)?;
        } else {
            writeln!(out, "Delete cancelled.")?;
        }
        return Ok(Flow::Continue);
    }

    match name {
        "q" | "quit" | "exit" => return Ok(Flow::Quit),
        "h" | "help" => writeln!(out, "{}", HELP)?,
        "n" | "new" => {
            report_save(session.new_note(), out)?;
            writeln!(out, "New note. Start typing.")?;
        }
        "ls" | "list" => list_notes(session, out)?,
        "o" | "open" => open_note(session, arg, out)?,
        "s" | "search" => {
            session.set_query(arg);
            list_notes(session, out)?;
        }
        "p" | "show" => show_current(session, out)?,
        "clear" => {
            session.edit("", now());
            writeln!(out, "Cleared. The note is removed unless you type something.")?;
        }
        "w" | "save" => match session.flush() {
            SaveReport::Unchanged => writeln!(out, "Nothing to save.")?,
            report => report_save(report, out)?,
        },
        "d" | "delete" => {
            state.confirm_delete = true;
            writeln!(out, "Delete '{}'? Type :yes to confirm.", session.title())?;
        }
        "stats" => writeln!(out, "{}", session.stats())?,
        "" => writeln!(out, "Type :help for commands.")?,
        other => writeln!(out, "Unknown command ':{}'. Type :help for commands.", other)?,
    }

    Ok(Flow::Continue)
}

fn open_note<W: Write>(session: &mut Session, key: &str, out: &mut W) -> Result<()> {
    if key.is_empty() {
        writeln!(out, "Usage: :open <n|id>")?;
        return Ok(());
    }

    // Numbers refer to the list as currently filtered.
    let target = match parse_position(key) {
        Some(position) => position
            .checked_sub(1)
            .and_then(|idx| session.visible_notes().get(idx).map(|n| n.id)),
        None => match session.store().resolve(key) {
            Ok(note) => Some(note.id),
            Err(e) => {
                writeln!(out, "{}", e)?;
                return Ok(());
            }
        },
    };

    let Some(id) = target else {
        writeln!(out, "No note number {}. Type :list to see notes.", key)?;
        return Ok(());
    };

    let report = session.select(id)?;
    report_save(report, out)?;
    show_current(session, out)
}

fn list_notes<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let notes = session.visible_notes();
    if notes.is_empty() {
        if session.query().trim().is_empty() {
            writeln!(out, "No notes yet.")?;
        } else {
            writeln!(out, "No notes match '{}'.", session.query())?;
        }
        return Ok(());
    }

    if !session.query().trim().is_empty() {
        writeln!(out, "Notes matching '{}':", session.query())?;
    }
    let current = session.current().id;
    for (idx, note) in notes.iter().enumerate() {
        let marker = if note.id == current { '*' } else { ' ' };
        writeln!(
            out,
            "{} {:>3}. {}  [{}]",
            marker,
            idx + 1,
            note.title(),
            note.updated_at.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}

fn show_current<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    writeln!(out, "== {} ==", session.title())?;
    if !session.buffer().is_empty() {
        writeln!(out, "{}", session.buffer())?;
    }
    Ok(())
}

fn report_autosave<W: Write>(session: &Session, report: SaveReport, out: &mut W) -> Result<()> {
    match report {
        SaveReport::Saved(_) => writeln!(out, "Auto-saved  ·  {}", session.stats())?,
        report => report_save(report, out)?,
    }
    Ok(())
}

fn report_save<W: Write>(report: SaveReport, out: &mut W) -> Result<()> {
    match report {
        SaveReport::Saved(note) => writeln!(out, "Saved: {}", note.title())?,
        SaveReport::Removed(_) => writeln!(out, "Empty note removed.")?,
        SaveReport::Unchanged => {}
        SaveReport::Failed(reason) => writeln!(
            out,
            "Warning: could not save: {}. Your text is kept; use :save to retry.",
            reason
        )?,
    }
    Ok(())
}
