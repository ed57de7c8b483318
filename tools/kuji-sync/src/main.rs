//! Kuji Sync
//!
//! Fetches lottery draw results from every configured source and upserts
//! them into a local SQLite database or a PostgREST table. Safe to re-run:
//! every store is unique on `(game_id, draw_date, numbers)`.

mod catalog;
mod fetch;
mod runner;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use kuji_core::{DrawRecord, DrawStore, GameSpec, MemoryStore, Pipeline, UpsertSink};
use kuji_store::{RestStore, SqliteStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::fetch::{Fetcher, RetryPolicy};
use crate::runner::{Mode, RunConfig, Runner};

/// Default database path
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kuji")
        .join("draws.db")
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "kuji-sync")]
#[command(about = "Fetch lottery draw results and store them idempotently")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Game catalog JSON file replacing the built-in one
    #[arg(short, long, env = "KUJI_GAMES", global = true)]
    games: Option<PathBuf>,

    /// Only sync these game ids (comma separated)
    #[arg(short, long, value_delimiter = ',', global = true)]
    only: Vec<String>,

    /// PostgREST project URL; selects the remote store
    #[arg(long, env = "SUPABASE_URL", global = true)]
    rest_url: Option<String>,

    /// PostgREST service key
    #[arg(long, env = "SUPABASE_SERVICE_KEY", hide_env_values = true, global = true)]
    rest_key: Option<String>,

    /// Unique columns PostgREST merges resolve against (`on_conflict`)
    #[arg(long, env = "KUJI_CONFLICT_TARGET", global = true)]
    conflict_target: Option<String>,

    /// SQLite database path
    #[arg(long, env = "KUJI_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Parse and validate but keep results in memory
    #[arg(long, global = true)]
    dry_run: bool,

    /// Extra attempts per failed fetch
    #[arg(long, default_value_t = 2, global = true)]
    retries: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest draws of every game
    Daily,
    /// Walk year pages back to each game's start year
    Backfill {
        /// First year to fetch, overriding each game's own
        #[arg(long)]
        from_year: Option<i32>,
    },
    /// Run the pipeline on a local file and print the records as JSON lines
    Parse {
        /// Game the document belongs to
        #[arg(long)]
        game: String,

        /// Document to parse
        file: PathBuf,
    },
    /// List the catalog
    Games,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let games = catalog::load(cli.games.as_deref(), &cli.only)?;

    let mode = match cli.command {
        Commands::Daily => Mode::Daily,
        Commands::Backfill { .. } => Mode::Backfill,
        Commands::Parse { ref game, ref file } => {
            parse_file(&games, game, file)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Games => {
            write_catalog(&games, &mut io::stdout().lock())?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let mut config = RunConfig::new(mode, chrono::Local::now().year());
    if let Commands::Backfill { from_year } = cli.command {
        config.from_year = from_year;
    }
    let fetcher = Fetcher::new(RetryPolicy {
        retries: cli.retries,
        ..RetryPolicy::default()
    })?;

    let summary = if cli.dry_run {
        info!("dry run, nothing is persisted");
        sync(fetcher, MemoryStore::new(), config, &games).await?
    } else {
        match (cli.rest_url, cli.rest_key) {
            (Some(url), Some(key)) => {
                info!(%url, "writing to PostgREST");
                let mut store = RestStore::new(&url, key)?;
                if let Some(columns) = cli.conflict_target {
                    store = store.with_conflict_target(columns);
                }
                sync(fetcher, store, config, &games).await?
            }
            (Some(_), None) => bail!("--rest-url requires --rest-key (or SUPABASE_SERVICE_KEY)"),
            (None, _) => {
                let path = cli.db.unwrap_or_else(default_db_path);
                let store = SqliteStore::open(&path)
                    .with_context(|| format!("opening database {}", path.display()))?;
                info!(path = %path.display(), "writing to SQLite");
                sync(fetcher, store, config, &games).await?
            }
        }
    };

    summary.log();
    if summary.too_many_failures() {
        error!(failed = summary.failed, games = summary.games, "too many failures");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn sync<S: DrawStore>(
    fetcher: Fetcher,
    store: S,
    config: RunConfig,
    games: &[GameSpec],
) -> Result<runner::RunSummary> {
    let pipeline = Pipeline::new()?;
    let mut runner = Runner::new(fetcher, pipeline, UpsertSink::new(store), config);
    Ok(runner.run(games).await)
}

fn parse_file(games: &[GameSpec], id: &str, file: &Path) -> Result<()> {
    let game = catalog::find(games, id)?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;

    let ingest = Pipeline::new()?.ingest(game, &text)?;
    write_records(&ingest.records, &mut io::stdout().lock())?;
    info!(
        game = %game.id,
        candidates = ingest.report.candidates,
        rejected = ingest.report.rejected,
        duplicates = ingest.report.duplicates,
        records = ingest.records.len(),
        "parsed"
    );
    Ok(())
}

/// Writes one storage-shaped JSON object per line.
fn write_records(records: &[DrawRecord], out: &mut impl Write) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, &record.to_stored())?;
        writeln!(out)?;
    }
    Ok(())
}

/// Writes `id`, source kind and name, tab separated, one game per line.
fn write_catalog(games: &[GameSpec], out: &mut impl Write) -> Result<()> {
    for game in games {
        writeln!(out, "{}\t{}\t{}", game.id, game.source.kind(), game.name)?;
    }
    Ok(())
}
