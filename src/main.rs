//! # Registrar Harvest CLI (`rgh`)
//!
//! The `rgh` binary is the operator's interface for harvesting the
//! registrar's course data into the local JSON cache.
//!
//! ## Usage
//!
//! ```bash
//! rgh --config ./config/rgh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rgh cache-evals` | Scrape course evaluations into `out/evals/` |
//! | `rgh cache-courses` | Cache catalog listings and details into `out/courses/` and `out/details/` |
//! | `rgh print-depts` | List department codes for a term (or all terms) |
//! | `rgh stats` | Summarize the evaluation cache |
//!
//! ## Credentials
//!
//! `cache-evals` needs a live session cookie for the evaluation site,
//! taken from the `PHPSESSID` environment variable or collected by an
//! interactive prompt (also re-invoked mid-run when the session expires).
//! `cache-courses` needs the catalog API key in `OIT_API_KEY`.
//!
//! ## Examples
//!
//! ```bash
//! # Evaluations for two terms, overwriting stale entries
//! PHPSESSID=... rgh cache-evals --terms 1244,1242 --force
//!
//! # Full catalog crawl for one term, two departments
//! OIT_API_KEY=... rgh cache-courses --terms 1244 --depts COS,MAT
//!
//! # What ended up in the cache?
//! rgh stats
//! ```

mod cache;
mod catalog;
mod classify;
mod config;
mod courses;
mod depts;
mod eval_client;
mod extract;
mod ingest;
mod models;
mod progress;
mod registrar;
mod session;
mod stats;
mod terms;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::progress::ProgressMode;

/// Registrar Harvest CLI — caches course catalog, seat, and evaluation
/// data from the registrar's sources as per-entity JSON files.
#[derive(Parser)]
#[command(
    name = "rgh",
    about = "Registrar Harvest — course catalog, seat, and evaluation cacher",
    version,
    long_about = "Registrar Harvest pulls course data from three independent sources \
    (the public listings API, the catalog API, and the session-protected evaluation site), \
    normalizes it, and persists it to a local JSON file cache keyed by term and course."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rgh.toml`. Built-in defaults apply when the
    /// file does not exist; see `config/rgh.example.toml`.
    #[arg(long, global = true, default_value = "./config/rgh.toml")]
    config: PathBuf,

    /// Progress reporting on stderr: `off`, `human`, or `json`.
    ///
    /// Defaults to `human` when stderr is a TTY, `off` otherwise.
    #[arg(long, global = true)]
    progress: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Cache course evaluations.
    ///
    /// Enumerates course IDs per term, scrapes each course's evaluation
    /// page in small concurrent batches, and writes one JSON record per
    /// course to `out/evals/<term>/`. Pauses for a replacement session
    /// cookie whenever the site invalidates the current one.
    CacheEvals {
        /// Terms to fetch, comma separated. All terms with published
        /// evaluations when omitted.
        #[arg(long, value_delimiter = ',')]
        terms: Vec<String>,

        /// Overwrite cache entries that already exist.
        #[arg(long)]
        force: bool,
    },

    /// Cache catalog course listings and per-course details.
    ///
    /// For each term and department, caches the department's course list
    /// and every course's detail record from the catalog API.
    CacheCourses {
        /// Terms to fetch, comma separated. All known terms when omitted.
        #[arg(long, value_delimiter = ',')]
        terms: Vec<String>,

        /// Department codes to fetch, comma separated. Every department
        /// listed for the term when omitted.
        #[arg(long, value_delimiter = ',')]
        depts: Vec<String>,

        /// Overwrite cache entries that already exist.
        #[arg(long)]
        force: bool,
    },

    /// Print department codes.
    ///
    /// With `--term`, the codes listed for that term; otherwise the
    /// union across all known terms.
    PrintDepts {
        /// Term to list departments for.
        #[arg(long)]
        term: Option<String>,
    },

    /// Summarize the evaluation cache.
    ///
    /// Prints record counts per term and the rating-category frequency
    /// table, most common first.
    Stats {
        /// Restrict the summary to these terms, comma separated.
        #[arg(long, value_delimiter = ',')]
        terms: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_or_default(&cli.config)?;
    let mode = match &cli.progress {
        Some(value) => ProgressMode::from_flag(value)?,
        None => ProgressMode::default_for_tty(),
    };

    match cli.command {
        Commands::CacheEvals { terms, force } => {
            let prompt = session::StdinPrompt::new(cfg.evals.base_url.clone());
            let store = session::SessionStore::from_env_or_prompt(&prompt)?;
            let fetcher = eval_client::HttpEvalClient::new(&cfg.evals)?;
            let listings = registrar::RegistrarClient::new(&cfg.registrar)?;
            let reporter = mode.reporter();

            ingest::run_eval_sync(
                &cfg,
                &listings,
                &fetcher,
                &store,
                &prompt,
                reporter.as_ref(),
                &terms,
                force,
            )
            .await?;
        }
        Commands::CacheCourses {
            terms,
            depts,
            force,
        } => {
            let listings = registrar::RegistrarClient::new(&cfg.registrar)?;
            let catalog = catalog::CatalogClient::from_env(&cfg.catalog)?;

            courses::run_course_sync(&cfg, &listings, &catalog, &terms, &depts, force).await?;
        }
        Commands::PrintDepts { term } => {
            let listings = registrar::RegistrarClient::new(&cfg.registrar)?;
            depts::run_print_depts(&listings, term.as_deref()).await?;
        }
        Commands::Stats { terms } => {
            stats::run_stats(&cfg, &terms)?;
        }
    }

    Ok(())
}
