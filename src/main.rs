//! Dialogue CLI - command-line authoring tool for dialogue lines and groups

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialogue_backend::config::{self, StoreConfig};
use dialogue_backend::ui::{self, Icons};
use dialogue_backend::{diagnostics, DialogueBackend, DialogueGroup, ReloadStrategy};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dialogue")]
#[command(version)]
#[command(about = "Author game dialogue lines and groups stored in SQLite")]
#[command(long_about = r#"
Dialogue keeps narrative content in a SQLite database:
  • Dialogue lines, addressed by an integer ID
  • Dialogue groups, named ordered lists of dialogue elements

Example usage:
  dialogue init --database story.db
  dialogue line add "Hello, traveller."
  dialogue group create intro "Hi" "Welcome to the village"
  dialogue group show intro
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Cache reload strategy: swap or clear (overrides the config file)
    #[arg(long, global = true)]
    reload: Option<ReloadStrategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database tables
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Check that a database can be opened
    Probe {
        /// Database to check (defaults to the configured database)
        location: Option<PathBuf>,
    },

    /// Show store and cache statistics
    Stats,

    /// Manage dialogue lines
    #[command(subcommand)]
    Line(LineCommand),

    /// Manage dialogue groups
    #[command(subcommand)]
    Group(GroupCommand),
}

#[derive(Subcommand)]
enum LineCommand {
    /// Print the text of a line
    Get {
        id: i64,

        /// Read from the database instead of the cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Add a new line
    Add { text: String },
    /// Replace the text of a line
    Update { id: i64, text: String },
    /// Delete a line
    Delete { id: i64 },
    /// List all lines
    List,
}

#[derive(Subcommand)]
enum GroupCommand {
    /// List all groups
    List,
    /// Show the elements of a group
    Show {
        id: String,

        /// Read from the database instead of the cache
        #[arg(long)]
        from_store: bool,
    },
    /// Create a group; fails if the ID is taken
    Create { id: String, elements: Vec<String> },
    /// Append an element to a group
    Append { id: String, text: String },
    /// Remove the element at INDEX from a group
    Remove { id: String, index: usize },
    /// Delete a group
    Delete { id: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(cli.verbose)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut store_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    if let Some(database) = cli.database {
        store_config.database = database;
    }
    if let Some(reload) = cli.reload {
        store_config.reload_strategy = reload;
    }

    match cli.command {
        Commands::Init { force } => {
            let config_path = cli.config.unwrap_or_else(config::default_config_path);
            config::ensure_db_dir(&store_config.database)?;
            if store_config.database.exists() {
                ui::warn(&format!(
                    "Using existing database {}",
                    store_config.database.display()
                ));
            }
            config::write_config(&config_path, &store_config, force)?;
            DialogueBackend::open(StoreConfig {
                create_schema: true,
                ..store_config.clone()
            })?;

            ui::header("Initialized dialogue store");
            ui::status(Icons::GEAR, "Config", &config_path.display().to_string());
            ui::status(Icons::DATABASE, "Database", &store_config.database.display().to_string());
        }

        Commands::Probe { location } => {
            let location = location.unwrap_or_else(|| store_config.database.clone());
            if diagnostics::test_connection(&location) {
                ui::success(&format!("Database valid: {}", location.display()));
            } else {
                ui::error(&format!("Database invalid: {}", location.display()));
                std::process::exit(1);
            }
        }

        Commands::Stats => {
            let backend = open_backend(store_config)?;
            let stats = backend.stats()?;

            ui::header(&format!(
                "Dialogue Statistics ({})",
                backend.source().location().display()
            ));
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Line(command) => run_line(open_backend(store_config)?, command)?,

        Commands::Group(command) => run_group(open_backend(store_config)?, command)?,
    }

    Ok(())
}

/// Log level used when `RUST_LOG` is unset
fn default_log_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Open the backend and load both caches
fn open_backend(store_config: StoreConfig) -> anyhow::Result<DialogueBackend> {
    let database = store_config.database.clone();
    let backend = DialogueBackend::open(store_config)
        .with_context(|| format!("failed to open {}", database.display()))?;
    let (lines, groups) = backend.initialize_caches()?;
    tracing::info!("Loaded {} lines and {} groups from {}", lines, groups, database.display());
    Ok(backend)
}

fn run_line(backend: DialogueBackend, command: LineCommand) -> anyhow::Result<()> {
    let lines = backend.lines();

    match command {
        LineCommand::Get { id, no_cache } => {
            println!("{}", lines.fetch(id, !no_cache)?);
        }

        LineCommand::Add { text } => {
            let id = lines.insert(&text, true)?;
            ui::success(&format!("Added line {}", id));
        }

        LineCommand::Update { id, text } => {
            lines.update(id, &text, true)?;
            ui::success(&format!("Updated line {}", id));
        }

        LineCommand::Delete { id } => {
            lines.delete(id, true)?;
            ui::success(&format!("Deleted line {}", id));
        }

        LineCommand::List => {
            let all = lines.list()?;
            if all.is_empty() {
                ui::info("Lines", "none");
            } else {
                println!("{}", ui::lines_table(&all));
            }
        }
    }

    Ok(())
}

fn run_group(backend: DialogueBackend, command: GroupCommand) -> anyhow::Result<()> {
    let groups = backend.groups();

    match command {
        GroupCommand::List => {
            let ids = groups.cached_ids();
            if ids.is_empty() {
                ui::info("Groups", "none");
            } else {
                let all: Vec<DialogueGroup> = ids
                    .iter()
                    .map(|id| groups.fetch_from_cache(id))
                    .collect::<Result<_, _>>()?;
                println!("{}", ui::groups_table(&all));
            }
        }

        GroupCommand::Show { id, from_store } => {
            let group = if from_store {
                groups.fetch_from_store(&id)?
            } else {
                groups.fetch_from_cache(&id)?
            };

            ui::section(&group.id);
            if group.is_empty() {
                println!("  {}", ui::muted("(no elements)"));
            }
            for (index, text) in group.elements.iter().enumerate() {
                ui::element(index, text);
            }
        }

        GroupCommand::Create { id, elements } => {
            let group = DialogueGroup::with_elements(id, elements);
            groups.insert_new(&group, true)?;
            ui::success(&format!("Created group '{}' with {} elements", group.id, group.len()));
        }

        GroupCommand::Append { id, text } => {
            let group = groups.fetch_from_cache(&id)?.with_element(text);
            groups.update(&group, true)?;
            ui::success(&format!("Appended element {} to '{}'", group.len() - 1, id));
        }

        GroupCommand::Remove { id, index } => {
            let current = groups.fetch_from_cache(&id)?;
            let Some(group) = current.without_element(index) else {
                anyhow::bail!(
                    "group '{}' has {} elements, no element at index {}",
                    id,
                    current.len(),
                    index
                );
            };
            groups.update(&group, true)?;
            ui::success(&format!("Removed element {} from '{}'", index, id));
        }

        GroupCommand::Delete { id } => {
            groups.delete(&id, true)?;
            ui::success(&format!("Deleted group '{}'", id));
        }
    }

    Ok(())
}
