use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sqlrunner::db::bootstrap_demo_schema;
use sqlrunner::{export, server, Config, SplitMode};

/// Run raw SQL batches against an embedded SQLite database
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/sqlrunner/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long = "db", env = "SQLRUNNER_DB", global = true)]
    db_path: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "SQLRUNNER_BIND", global = true)]
    bind: Option<String>,

    /// Skip bearer-token inspection
    #[arg(long, env = "ALLOW_UNAUTH", global = true)]
    allow_unauth: bool,

    /// Statement splitting: "naive" or "quote-aware"
    #[arg(long, global = true)]
    split_mode: Option<SplitMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (the default)
    Serve {
        /// Create and seed the demo schema before serving
        #[arg(long)]
        init: bool,
    },
    /// Create and seed the demo schema
    InitDb,
    /// Run one batch and print the shaped response
    Run {
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// SQL batch; read from stdin when omitted
        sql: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(db_path) = &self.db_path {
            config.db_path = db_path.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if self.allow_unauth {
            config.allow_unauth = true;
        }
        if let Some(mode) = self.split_mode {
            config.split_mode = mode;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `run` output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command.unwrap_or(Command::Serve { init: false }) {
        Command::Serve { init } => {
            if init {
                bootstrap_demo_schema(&config.database())?;
            }
            server::serve(config).await
        }
        Command::InitDb => {
            let seeded = bootstrap_demo_schema(&config.database())?;
            println!(
                "Database initialized at {} ({} rows seeded)",
                config.db_path.display(),
                seeded
            );
            Ok(())
        }
        Command::Run { format, sql } => {
            let sql = match sql {
                Some(sql) => sql,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read SQL from stdin")?;
                    buf
                }
            };
            let pipeline = config.pipeline();
            let response = tokio::task::spawn_blocking(move || pipeline.run_batch(&sql)).await??;
            match format {
                OutputFormat::Json => println!("{}", export::to_json(&response)),
                OutputFormat::Csv => print!("{}", export::to_csv(&response)),
            }
            Ok(())
        }
    }
}
