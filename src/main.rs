use clap::Parser;
use snotes::cli::{
    handle_add, handle_delete, handle_list, handle_path, handle_search, handle_shell, handle_show,
    Cli, Commands,
};
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `SNOTES_LOG=debug`.
const LOG_ENV: &str = "SNOTES_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        None => handle_shell(),
        Some(Commands::List { json }) => handle_list(json),
        Some(Commands::Show { id, json }) => handle_show(id, json),
        Some(Commands::Add {
            content,
            stdin,
            json,
        }) => handle_add(content, stdin, json),
        Some(Commands::Search { query, json }) => handle_search(query, json),
        Some(Commands::Delete { id, force }) => handle_delete(id, force),
        Some(Commands::Path) => handle_path(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
