use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::{App, AppState};
use crate::config::ConfigLoader;
use crate::storage::{self, KeyValueStore};
use crate::undo::{Clock, SystemClock};

pub mod commands;

use self::commands::{AddArgs, DeleteArgs, EditArgs, SearchArgs, ThemeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "listkeep",
    version,
    about = "Keep a short list of titled items, searchable and undo-friendly"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over LISTKEEP_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over LISTKEEP_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive shell (default)
    Shell,
    /// Print every item, newest first
    List,
    /// Create an item
    Add(AddArgs),
    /// Change an item's title or subtitle
    Edit(EditArgs),
    /// Delete an item
    Delete(DeleteArgs),
    /// Print items whose title or subtitle contains the query
    Search(SearchArgs),
    /// Fill an empty list with sample items
    Seed,
    /// Show, toggle or set the theme
    Theme(ThemeArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("LISTKEEP_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("LISTKEEP_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&paths, &config.storage)?;
    tracing::debug!(db = %storage.database_path().display(), "storage ready");

    let kv: Arc<dyn KeyValueStore> = Arc::new(storage);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut state = AppState::init(&config, kv, clock);

    let command = cli.command.unwrap_or(Commands::Shell);
    let result = match command {
        Commands::Shell => {
            let mut app = App::new(state);
            let result = app.run();
            state = app.into_state();
            result
        }
        Commands::List => commands::print(commands::list_items(&state)),
        Commands::Add(args) => commands::print(commands::add_item(&mut state, args)),
        Commands::Edit(args) => commands::print(commands::edit_item(&mut state, args)),
        Commands::Delete(args) => commands::print(commands::delete_item(&mut state, args)),
        Commands::Search(args) => {
            commands::print(commands::search_items(&config, &mut state, args))
        }
        Commands::Seed => commands::print(commands::seed_items(&mut state)),
        Commands::Theme(args) => commands::print(commands::theme(&mut state, args)),
    };
    state.teardown();
    result
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
