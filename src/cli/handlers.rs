use std::io::{self, Read, Write};

use tokio::io::BufReader;

use crate::config::{data_dir, AppConfig};
use crate::entity::Note;
use crate::error::{Result, SnotesError};
use crate::search::{search, sort_by_recency};
use crate::session::Session;
use crate::storage::NoteStore;

use super::shell::run_shell;

/// Open the store in the data directory, reporting any recovery on stderr.
fn open_store() -> Result<NoteStore> {
    let dir = data_dir()?;
    let (store, notice) = NoteStore::open_in(&dir);
    if let Some(notice) = notice {
        eprintln!("Warning: {}", notice);
    }
    Ok(store)
}

fn print_listing(notes: &[&Note]) {
    for (idx, note) in notes.iter().enumerate() {
        println!(
            "  {:>3}. ({}) {}  [{}]",
            idx + 1,
            note.short_id(),
            note.title(),
            note.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
}

/// Launch the interactive shell on stdin/stdout.
pub fn handle_shell() -> Result<()> {
    let dir = data_dir()?;
    let (store, notice) = NoteStore::open_in(&dir);
    let config = AppConfig::load(&dir);
    let mut session = Session::start(store, config, dir);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(notice) = notice {
        writeln!(out, "Warning: {}", notice)?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_shell(
        &mut session,
        BufReader::new(tokio::io::stdin()),
        &mut out,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        },
    ));
    // A blocked stdin read would otherwise hold up runtime shutdown.
    runtime.shutdown_background();
    result
}

pub fn handle_list(json: bool) -> Result<()> {
    let store = open_store()?;
    let notes = sort_by_recency(store.notes());

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        println!("Notes:\n");
        print_listing(&notes);
    }

    Ok(())
}

pub fn handle_show(id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let note = store.resolve(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        println!("{} ({})", note.title(), note.id);
        println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M"));
        println!("Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M"));
        println!("\n{}", note.content);
    }

    Ok(())
}

pub fn handle_add(content: Option<String>, stdin: bool, json: bool) -> Result<()> {
    let content = if stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        content.unwrap_or_default()
    };
    let content = content.trim_end();
    if content.trim().is_empty() {
        return Err(SnotesError::EmptyNote);
    }

    let mut store = open_store()?;
    let note = store.upsert(Note::new(content))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Created note ({}) - {}", note.short_id(), note.title());
    }

    Ok(())
}

pub fn handle_search(query: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let results = search(store.notes(), &query);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found for '{}'.", query);
    } else {
        println!("Search results for '{}':\n", query);
        print_listing(&results);
    }

    Ok(())
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let mut store = open_store()?;
    let note = store.resolve(&id)?.clone();

    if !force {
        eprintln!("Delete note ({}) - {}? [y/N] ", note.short_id(), note.title());

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            return Err(SnotesError::Storage(
                "Use --force to delete in non-interactive mode".to_string(),
            ));
        }
    }

    store.delete(&note.id)?;
    println!("Deleted note ({}) - {}", note.short_id(), note.title());

    Ok(())
}

pub fn handle_path() -> Result<()> {
    let store = open_store()?;
    println!("{}", store.path().display());
    Ok(())
}
