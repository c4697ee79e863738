use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn snotes_cmd(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_snotes"));
    cmd.env("SNOTES_DIR", data_dir.path());
    cmd.env_remove("SNOTES_LOG");
    cmd
}

fn run_with_stdin(data_dir: &TempDir, args: &[&str], input: &str) -> Output {
    let mut child = snotes_cmd(data_dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn notes_json(data_dir: &TempDir) -> serde_json::Value {
    let raw = fs::read_to_string(data_dir.path().join("notes.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_shell_saves_typed_note() {
    let tmp = TempDir::new().unwrap();

    let output = run_with_stdin(&tmp, &[], "Hello\nWorld\n:quit\n");
    assert!(output.status.success());

    let notes = notes_json(&tmp);
    let notes = notes.as_object().unwrap();
    assert_eq!(notes.len(), 1);
    let note = notes.values().next().unwrap();
    assert_eq!(note["content"], "Hello\nWorld");
    assert!(note["id"].is_string());
    assert!(note["created_at"].is_string());
    assert!(note["updated_at"].is_string());

    let config = fs::read_to_string(tmp.path().join("config.json")).unwrap();
    assert!(config.contains("last_note_id"));
}

#[test]
fn test_shell_reopens_last_note() {
    let tmp = TempDir::new().unwrap();

    run_with_stdin(&tmp, &[], "First note\n:new\nSecond note\n:save\n:open 2\n:quit\n");
    let output = run_with_stdin(&tmp, &[], ":show\n:quit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("== First note =="));
}

#[test]
fn test_corrupt_store_recovers() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("notes.json"), "{not json").unwrap();

    let output = run_with_stdin(&tmp, &[], "Fresh start\n:quit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Warning:"));
    assert!(stdout.contains("unreadable"));

    let backups: Vec<_> = fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(notes_json(&tmp).as_object().unwrap().len(), 1);
}

#[test]
fn test_add_list_and_search() {
    let tmp = TempDir::new().unwrap();

    let output = snotes_cmd(&tmp)
        .args(["add", "Meeting notes\nDiscussed the timeline"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Created note"));
    assert!(stdout.contains("Meeting notes"));

    snotes_cmd(&tmp)
        .args(["add", "Groceries\nmilk"])
        .output()
        .unwrap();

    let output = snotes_cmd(&tmp).args(["list"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Meeting notes"));
    assert!(stdout.contains("Groceries"));

    let output = snotes_cmd(&tmp)
        .args(["search", "TIMELINE", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["content"], "Meeting notes\nDiscussed the timeline");

    let output = snotes_cmd(&tmp)
        .args(["search", "nothing-matches"])
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("No results found"));
}

#[test]
fn test_add_from_stdin() {
    let tmp = TempDir::new().unwrap();

    let output = run_with_stdin(&tmp, &["add", "--stdin", "--json"], "Piped title\nbody\n");
    assert!(output.status.success());
    let note: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(note["content"], "Piped title\nbody");
}

#[test]
fn test_add_empty_fails() {
    let tmp = TempDir::new().unwrap();

    let output = snotes_cmd(&tmp).args(["add", "   "]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("empty note"));
}

#[test]
fn test_show_and_delete() {
    let tmp = TempDir::new().unwrap();

    snotes_cmd(&tmp)
        .args(["add", "Delete me\nsoon"])
        .output()
        .unwrap();

    let output = snotes_cmd(&tmp).args(["show", "1"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Delete me"));
    assert!(stdout.contains("soon"));

    // Non-interactive delete needs --force
    let output = snotes_cmd(&tmp)
        .args(["delete", "1"])
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(notes_json(&tmp).as_object().unwrap().len(), 1);

    let output = snotes_cmd(&tmp)
        .args(["delete", "1", "--force"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(notes_json(&tmp).as_object().unwrap().is_empty());

    let output = snotes_cmd(&tmp).args(["show", "1"]).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Note not found"));
}

#[test]
fn test_path_points_into_data_dir() {
    let tmp = TempDir::new().unwrap();

    let output = snotes_cmd(&tmp).args(["path"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().ends_with("notes.json"));
    assert!(stdout.contains(&*tmp.path().to_string_lossy()));
}

#[test]
fn test_list_empty() {
    let tmp = TempDir::new().unwrap();

    let output = snotes_cmd(&tmp).args(["list"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No notes found."));
}
