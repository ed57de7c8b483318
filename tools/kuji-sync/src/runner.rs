//! Run orchestration: one pass over the selected games, each fetched,
//! ingested and written independently so one broken source never stops
//! the others.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use kuji_core::{
    dedup_records, DrawRecord, DrawStore, GameSpec, KujiError, Pipeline, Source, SourceKind,
    UpsertSink,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::catalog::{page_url, LOTTERY_NET};
use crate::fetch::{DocumentSource, FetchError};

/// Pages shorter than this are treated as empty.
pub const MIN_PAGE_BYTES: usize = 500;

/// Consecutive fetch failures or empty pages that end a backfill.
pub const MAX_EMPTY_YEARS: u32 = 5;

/// Consecutive years without a single parsed draw that end a backfill.
pub const MAX_BARREN_YEARS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Current year of every HTML game, most recent rows of the CSV feed.
    Daily,
    /// Every year page back to the game's start year; full feeds.
    Backfill,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub current_year: i32,
    /// Overrides each game's own start year in backfill mode.
    pub from_year: Option<i32>,
    pub html_base: String,
    /// Rows kept from a CSV feed in daily mode.
    pub recent_limit: usize,
    /// Pause after each HTML game.
    pub game_delay: Duration,
    /// Pause between year pages during a backfill.
    pub year_delay: Duration,
}

impl RunConfig {
    pub fn new(mode: Mode, current_year: i32) -> Self {
        Self {
            mode,
            current_year,
            from_year: None,
            html_base: LOTTERY_NET.to_string(),
            recent_limit: 100,
            game_delay: Duration::from_millis(500),
            year_delay: Duration::from_millis(800),
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] KujiError),

    #[error("0 draws fetched")]
    NoDraws,
}

/// What one successful game contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub fetched: usize,
    pub upserted: usize,
    pub failed_writes: usize,
    pub oldest: Option<NaiveDate>,
    pub newest: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub games: usize,
    pub updated: usize,
    pub failed: usize,
    pub rows: usize,
    pub errors: Vec<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// More than a quarter of the selected games failed.
    pub fn too_many_failures(&self) -> bool {
        self.failed * 4 > self.games
    }

    pub fn log(&self) {
        info!(
            updated = self.updated,
            failed = self.failed,
            rows = self.rows,
            elapsed_secs = self.elapsed.as_secs(),
            "run finished"
        );
        for e in &self.errors {
            warn!("{e}");
        }
    }
}

pub struct Runner<F, S> {
    fetcher: F,
    pipeline: Pipeline,
    sink: UpsertSink<S>,
    config: RunConfig,
}

impl<F: DocumentSource, S: DrawStore> Runner<F, S> {
    pub fn new(fetcher: F, pipeline: Pipeline, sink: UpsertSink<S>, config: RunConfig) -> Self {
        Self {
            fetcher,
            pipeline,
            sink,
            config,
        }
    }

    /// Syncs every game in order and summarizes the run.
    pub async fn run(&mut self, games: &[GameSpec]) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary {
            games: games.len(),
            ..RunSummary::default()
        };
        info!(games = games.len(), mode = ?self.config.mode, "run started");

        for game in games {
            match self.sync_game(game).await {
                Ok(outcome) => {
                    info!(
                        game = %game.id,
                        name = %game.name,
                        fetched = outcome.fetched,
                        upserted = outcome.upserted,
                        failed_writes = outcome.failed_writes,
                        oldest = ?outcome.oldest,
                        newest = ?outcome.newest,
                        "game updated"
                    );
                    summary.updated += 1;
                    summary.rows += outcome.upserted;
                }
                Err(GameError::NoDraws) => {
                    warn!(game = %game.id, name = %game.name, "0 draws fetched");
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {}", game.id, GameError::NoDraws));
                }
                Err(e) => {
                    error!(game = %game.id, name = %game.name, error = %e, "game failed");
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {e}", game.id));
                }
            }

            if game.source.kind() == SourceKind::Html {
                pause(self.config.game_delay).await;
            }
        }

        summary.elapsed = started.elapsed();
        summary
    }

    /// Collects and writes the draws of one game.
    ///
    /// # Errors
    ///
    /// Fails when the source cannot be fetched or parsed, or yields no
    /// valid draw.
    pub async fn sync_game(&mut self, game: &GameSpec) -> Result<GameOutcome, GameError> {
        let records = self.collect(game).await?;
        if records.is_empty() {
            return Err(GameError::NoDraws);
        }

        let report = self.sink.write(&game.id, &records).await;
        Ok(GameOutcome {
            fetched: records.len(),
            upserted: report.written,
            failed_writes: report.failed,
            oldest: records.iter().map(|r| r.date).min(),
            newest: records.iter().map(|r| r.date).max(),
        })
    }

    async fn collect(&self, game: &GameSpec) -> Result<Vec<DrawRecord>, GameError> {
        match &game.source {
            Source::Json { url } => {
                let text = self.fetcher.fetch_text(url).await?;
                Ok(self.pipeline.ingest(game, &text)?.records)
            }
            Source::Csv { url } => {
                let text = self.fetcher.fetch_text(url).await?;
                let mut records = self.pipeline.ingest(game, &text)?.records;
                if self.config.mode == Mode::Daily {
                    records.truncate(self.config.recent_limit);
                }
                Ok(records)
            }
            Source::Html {
                path,
                slug,
                alt_slug,
                start_year,
            } => {
                let first_year = match self.config.mode {
                    Mode::Daily => self.config.current_year,
                    Mode::Backfill => self
                        .config
                        .from_year
                        .or(*start_year)
                        .unwrap_or(self.config.current_year),
                };
                let pages = HtmlPages {
                    path,
                    slug,
                    alt_slug: alt_slug.as_deref(),
                };
                if first_year >= self.config.current_year {
                    self.current_year(game, &pages).await
                } else {
                    Ok(self.backfill(game, &pages, first_year).await)
                }
            }
        }
    }

    async fn current_year(&self, game: &GameSpec, pages: &HtmlPages<'_>) -> Result<Vec<DrawRecord>, GameError> {
        let html = self.fetch_page(pages, self.config.current_year).await?;
        if html.len() < MIN_PAGE_BYTES {
            debug!(game = %game.id, bytes = html.len(), "page too short");
            return Ok(Vec::new());
        }
        Ok(self.pipeline.ingest(game, &html)?.records)
    }

    /// Walks year pages from the current year down to `first_year`.
    async fn backfill(&self, game: &GameSpec, pages: &HtmlPages<'_>, first_year: i32) -> Vec<DrawRecord> {
        info!(game = %game.id, from = self.config.current_year, to = first_year, "backfilling");
        let mut all = Vec::new();
        let mut streak = 0;

        for year in (first_year..=self.config.current_year).rev() {
            let html = match self.fetch_page(pages, year).await {
                Ok(html) if html.len() >= MIN_PAGE_BYTES => html,
                Ok(html) => {
                    info!(game = %game.id, year, bytes = html.len(), "empty page");
                    streak += 1;
                    if streak >= MAX_EMPTY_YEARS {
                        info!(game = %game.id, streak, "too many empty years, stopping");
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    warn!(game = %game.id, year, error = %e, "year fetch failed");
                    streak += 1;
                    if streak >= MAX_EMPTY_YEARS {
                        info!(game = %game.id, streak, "too many failed years, stopping");
                        break;
                    }
                    continue;
                }
            };

            let records = match self.pipeline.ingest(game, &html) {
                Ok(ingest) => ingest.records,
                Err(e) => {
                    warn!(game = %game.id, year, error = %e, "year parse failed");
                    Vec::new()
                }
            };

            if records.is_empty() {
                let normalized = self.pipeline.normalizer().normalize(&html);
                let stats = self.pipeline.html().page_stats(&normalized);
                info!(
                    game = %game.id,
                    year,
                    kib = stats.bytes / 1024,
                    rows = stats.rows,
                    list_items = stats.list_items,
                    text_dates = stats.text_dates,
                    path_dates = stats.path_dates,
                    "0 draws parsed"
                );
                if all.is_empty() && year == self.config.current_year {
                    let sample: String = html.chars().take(1000).collect();
                    debug!(game = %game.id, %sample, "page sample");
                }
                streak += 1;
                if streak >= MAX_BARREN_YEARS {
                    info!(game = %game.id, streak, "too many years without draws, stopping");
                    break;
                }
            } else {
                streak = 0;
                all.extend(records);
                info!(game = %game.id, year, total = all.len(), "year parsed");
            }

            pause(self.config.year_delay).await;
        }

        all.sort_by(|a, b| b.date.cmp(&a.date));
        dedup_records(all)
    }

    /// Fetches a year page, falling back to the alternate slug.
    async fn fetch_page(&self, pages: &HtmlPages<'_>, year: i32) -> Result<String, FetchError> {
        let url = page_url(&self.config.html_base, pages.path, pages.slug, year);
        match self.fetcher.fetch_text(&url).await {
            Ok(html) => Ok(html),
            Err(e) => match pages.alt_slug {
                Some(alt) => {
                    debug!(%url, error = %e, alt, "trying alternate slug");
                    let url = page_url(&self.config.html_base, pages.path, alt, year);
                    self.fetcher.fetch_text(&url).await
                }
                None => Err(e),
            },
        }
    }
}

struct HtmlPages<'a> {
    path: &'a str,
    slug: &'a str,
    alt_slug: Option<&'a str>,
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
