//! Evaluation batch ingestion.
//!
//! Coordinates the full harvest flow for each requested term: enumerate
//! course IDs, fetch pages in fixed-width concurrent slices, classify
//! every response, extract and cache the successes, and skip the rest.
//! When the session dies mid-slice the controller pauses for interactive
//! re-authentication and retries the interrupted slice from its starting
//! offset. Items already cached from that slice are fetched and written
//! again; the cache's overwrite semantics make that safe.

use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;

use crate::cache::{self, WriteOutcome};
use crate::classify::{classify, FetchOutcome};
use crate::config::Config;
use crate::eval_client::EvalFetch;
use crate::extract::parse_eval_page;
use crate::models::WorkItem;
use crate::progress::{EvalProgressEvent, EvalProgressReporter};
use crate::registrar::CourseListings;
use crate::session::{SessionStore, TokenPrompt};
use crate::terms;

/// Run the evaluation harvest over `terms` (all terms with published
/// evaluations when empty).
///
/// Per-item failures are reported and skipped; only enumeration failures,
/// filesystem failures, and a failed re-authentication abort the run.
#[allow(clippy::too_many_arguments)]
pub async fn run_eval_sync(
    config: &Config,
    listings: &dyn CourseListings,
    fetcher: &dyn EvalFetch,
    session: &SessionStore,
    prompt: &dyn TokenPrompt,
    reporter: &dyn EvalProgressReporter,
    terms: &[String],
    force: bool,
) -> Result<()> {
    let terms: Vec<String> = if terms.is_empty() {
        terms::eval_terms().iter().map(|t| t.to_string()).collect()
    } else {
        terms.to_vec()
    };

    let width = config.evals.concurrency;
    let delay = Duration::from_millis(config.evals.batch_delay_ms);

    for term in &terms {
        let course_ids = listings.listing_ids(term).await?;
        println!(
            "Fetching evaluations for term {}. {} courses found.",
            term,
            course_ids.len()
        );
        reporter.report(EvalProgressEvent::TermStarted {
            term: term.clone(),
            courses: course_ids.len() as u64,
        });

        let items: Vec<WorkItem> = course_ids
            .into_iter()
            .map(|id| WorkItem::new(id, term.clone()))
            .collect();
        let total = items.len();

        let mut start = 0usize;
        while start < total {
            let end = (start + width).min(total);
            let slice = &items[start..end];

            // Every fetch in the slice reads the token current at dispatch
            // time; a replacement lands only on the next slice (or retry).
            let token = session.current().await;
            let responses = join_all(
                slice
                    .iter()
                    .map(|item| fetcher.fetch_eval_page(item, &token)),
            )
            .await;

            let mut expired = false;
            for (item, response) in slice.iter().zip(responses) {
                let outcome = match response {
                    Ok(page) => classify(page),
                    Err(err) => FetchOutcome::TransportError {
                        message: err.to_string(),
                    },
                };

                match outcome {
                    FetchOutcome::Success(doc) => {
                        let record = parse_eval_page(&doc);
                        let path =
                            cache::eval_path(&config.cache.out_dir, &item.term, &item.course_id);
                        match cache::write_json(&path, &record, force)? {
                            WriteOutcome::Written => {}
                            WriteOutcome::SkippedExisting => {
                                println!("WARNING: {} already exists. Skipping.", path.display())
                            }
                            WriteOutcome::Overwritten => {
                                println!("WARNING: {} already exists. Overwriting.", path.display())
                            }
                        }
                    }
                    FetchOutcome::SessionExpired { .. } => {
                        // Abort the rest of the slice, swap in a fresh
                        // token, and retry from the slice's start offset.
                        let replacement = prompt.reauth_token()?;
                        session.replace(replacement).await?;
                        println!("Session expired. Jumping back to index {}.", start);
                        reporter.report(EvalProgressEvent::SliceRetry {
                            term: term.clone(),
                            offset: start as u64,
                        });
                        expired = true;
                        break;
                    }
                    FetchOutcome::NoData { .. } => {
                        println!("No eval for {} in term {}.", item.course_id, item.term);
                    }
                    FetchOutcome::Redirected { url } => {
                        println!(
                            "Unexpected redirect for {} in term {}: {}",
                            item.course_id, item.term, url
                        );
                    }
                    FetchOutcome::TransportError { message } => {
                        println!(
                            "Fetch failed for {} in term {}: {}",
                            item.course_id, item.term, message
                        );
                    }
                }
            }

            if expired {
                // Retry proceeds immediately; the delay only separates
                // distinct slices.
                continue;
            }

            start = end;
            reporter.report(EvalProgressEvent::SliceDone {
                term: term.clone(),
                n: start as u64,
                total: total as u64,
            });
            if start < total {
                tokio::time::sleep(delay).await;
            }
        }

        println!("Finished fetching evaluations for term {}.", term);
        reporter.report(EvalProgressEvent::TermFinished { term: term.clone() });
    }

    Ok(())
}
