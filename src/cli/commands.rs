use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "snotes")]
#[command(version, about = "A small note-taking shell with auto-save and search")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Run a one-off command instead of the interactive shell
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List notes, most recently updated first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single note
    Show {
        /// Note id, unique id prefix, or position in `list`
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a new note
    Add {
        /// Note text; the first line becomes the title
        content: Option<String>,

        /// Read content from stdin
        #[arg(long, conflicts_with = "content")]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search note content (case-insensitive)
    Search {
        /// Text to look for; empty matches everything
        #[arg(default_value = "")]
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a note
    Delete {
        /// Note id, unique id prefix, or position in `list`
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Print the location of the notes file
    Path,
}
