//! AgriConnect CLI - operate the farming community platform backend

use agriconnect::config::{self, AgriConfig};
use agriconnect::ui::{self, Icons};
use agriconnect::{Database, queries};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "agriconnect")]
#[command(version = "0.0.1")]
#[command(about = "Farming community platform backend - CRUD over interchangeable persistence backends")]
#[command(long_about = r#"
AgriConnect runs a role-based farming community platform against one of
three interchangeable persistence backends:
  • embedded  - a SQLite file under the data directory (default)
  • ephemeral - an in-memory demo database, seeded fresh every start
  • remote    - the platform HTTP API

Example usage:
  agriconnect init
  agriconnect serve --port 3001
  agriconnect sql "SELECT name, role FROM users"
  agriconnect stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to agriconnect.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Serve the platform API over the configured backend
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
        port: u16,
    },

    /// Execute an ad-hoc SQL statement (the query console)
    Sql {
        /// The statement to execute
        statement: String,
    },

    /// Run a statement batch from a file
    Script {
        /// Path to the SQL file
        file: PathBuf,
    },

    /// Export the full database state to a file
    Export {
        /// Destination path
        #[arg(short, long, default_value = "agriconnect-snapshot.db")]
        output: PathBuf,
    },

    /// Replace the full database state from an exported file
    Import {
        /// Snapshot to load
        input: PathBuf,
    },

    /// Discard all data and reload schema + seed rows
    Reset,

    /// Show per-table row counts
    Stats,

    /// Attach a local file to a resource row
    Attach {
        /// Resource id to attach to
        #[arg(short, long)]
        resource: i64,

        /// File to upload
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &AgriConfig::default(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
            ui::status(
                Icons::DB,
                "backend",
                "embedded (edit the file to switch to remote or ephemeral)",
            );
        }

        Commands::Serve { port } => {
            let db = connect(&config).await?;
            agriconnect::server::start_server(port, db).await?;
        }

        Commands::Sql { statement } => {
            let db = connect(&config).await?;
            let cleaned = statement.trim();
            if cleaned.is_empty() {
                return Ok(());
            }

            // SELECTs render a grid; everything else reports what the
            // statement changed.
            let is_select = cleaned.to_lowercase().starts_with("select");
            if is_select {
                let rows = match db.query(cleaned, &[]).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        ui::error(&e.to_string());
                        std::process::exit(1);
                    }
                };
                if rows.is_empty() {
                    println!("∅ No rows returned.");
                } else {
                    println!("{}", ui::results_table(&rows));
                    ui::status(Icons::TABLE, "rows", &rows.len().to_string());
                }
            } else {
                match db.run(cleaned, &[]).await {
                    Ok(result) => {
                        ui::success(&format!(
                            "OK (changes: {}, lastInsertId: {})",
                            result.changes,
                            result
                                .last_insert_id
                                .map(|id| id.to_string())
                                .unwrap_or_else(|| "null".to_string()),
                        ));
                    }
                    Err(e) => {
                        ui::error(&e.to_string());
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Script { file } => {
            let db = connect(&config).await?;
            let script = std::fs::read_to_string(&file)?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
            spinner.set_message(format!("Running {}", file.display()));
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));

            let result = db.run_script(&script).await;
            spinner.finish_and_clear();

            match result {
                Ok(()) => ui::success("Script applied"),
                Err(e) => {
                    ui::error(&format!("Script aborted: {}", e));
                    std::process::exit(1);
                }
            }
        }

        Commands::Export { output } => {
            let db = connect(&config).await?;
            let bytes = db.export_snapshot().await?;
            if bytes.is_empty() {
                ui::warn("This backend has no exportable snapshot");
            } else {
                std::fs::write(&output, &bytes)?;
                ui::success(&format!(
                    "Exported {} bytes to {}",
                    bytes.len(),
                    output.display()
                ));
            }
        }

        Commands::Import { input } => {
            let db = connect(&config).await?;
            let bytes = std::fs::read(&input)?;
            db.import_snapshot(&bytes).await?;
            ui::success(&format!("Imported {}", input.display()));
        }

        Commands::Reset => {
            let db = connect(&config).await?;
            db.reset_to_seed().await?;
            println!("{} Database reset to seed data", Icons::SEED);
        }

        Commands::Stats => {
            let db = connect(&config).await?;
            let tables = [
                "users",
                "sectors",
                "events",
                "forums",
                "forum_posts",
                "resources",
                "sector_connections",
                "notifications",
                "content",
            ];

            let mut counts = Vec::new();
            for table in tables {
                let rows = db
                    .query(&format!("SELECT COUNT(*) AS n FROM {}", table), &[])
                    .await?;
                let n = rows
                    .first()
                    .and_then(|row| row.get("n"))
                    .and_then(|v| v.as_i64())
                    .unwrap_or(0);
                counts.push((table, n.to_string()));
            }

            ui::header("AgriConnect Statistics");
            let stats: Vec<(&str, &str)> = counts
                .iter()
                .map(|(table, n)| (*table, n.as_str()))
                .collect();
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Attach { resource, file } => {
            let db = connect(&config).await?;
            let attachment = agriconnect::files::encode_attachment(&file)?;
            let result = queries::attach_resource_file(
                &db,
                resource,
                &attachment.file_name,
                &attachment.file_blob,
                attachment.file_type.as_str(),
            )
            .await?;

            if result.changes == 0 {
                ui::warn(&format!("No resource with id {}", resource));
            } else {
                ui::success(&format!(
                    "Attached {} ({}) to resource {}",
                    attachment.file_name, attachment.file_type, resource
                ));
            }
        }
    }

    Ok(())
}

/// Connect once at startup; a failed connect is terminal for the
/// session and rendered as a full error surface.
async fn connect(config: &AgriConfig) -> anyhow::Result<Database> {
    match Database::connect(config).await {
        Ok(db) => Ok(db),
        Err(e) => {
            ui::section("Backend unavailable");
            ui::error(&e.to_string());
            ui::status(Icons::PLUG, "hint", "check agriconnect.toml or run `agriconnect init`");
            std::process::exit(1);
        }
    }
}
