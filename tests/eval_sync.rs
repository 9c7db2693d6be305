//! Integration tests for the evaluation batch controller.
//!
//! These tests drive `ingest::run_eval_sync` end to end with scripted
//! collaborators — a canned-page fetcher, a fixed enumerator, and a
//! scripted re-authentication prompt — and assert on the fetch-call
//! sequence and the on-disk cache state.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use registrar_harvest::cache;
use registrar_harvest::config::Config;
use registrar_harvest::eval_client::{EvalFetch, RawPage};
use registrar_harvest::ingest::run_eval_sync;
use registrar_harvest::models::{EvaluationRecord, WorkItem};
use registrar_harvest::progress::NoProgress;
use registrar_harvest::registrar::CourseListings;
use registrar_harvest::session::{SessionStore, TokenPrompt};

// ─── Stub collaborators ─────────────────────────────────────────────

struct FixedListings {
    ids: Vec<String>,
}

#[async_trait]
impl CourseListings for FixedListings {
    async fn listing_ids(&self, _term: &str) -> Result<Vec<String>> {
        Ok(self.ids.clone())
    }

    async fn dept_codes(&self, _term: &str) -> Result<Vec<String>> {
        Ok(vec![])
    }
}

/// Serves a full evaluation page for every request, with three scripted
/// exceptions, and records each fetch as (course id, token).
struct ScriptedFetcher {
    calls: Mutex<Vec<(String, String)>>,
    /// This (course id, token) pair bounces to the login page.
    dead: Option<(String, String)>,
    /// These course ids render the "not available online" page.
    no_data: Vec<String>,
    /// These course ids fail at the transport level.
    fail: Vec<String>,
}

impl ScriptedFetcher {
    fn serving_all() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            dead: None,
            no_data: vec![],
            fail: vec![],
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvalFetch for ScriptedFetcher {
    async fn fetch_eval_page(&self, item: &WorkItem, token: &str) -> Result<RawPage> {
        self.calls
            .lock()
            .unwrap()
            .push((item.course_id.clone(), token.to_string()));

        if let Some((course, dead_token)) = &self.dead {
            if *course == item.course_id && dead_token == token {
                return Ok(login_bounce());
            }
        }
        if self.fail.contains(&item.course_id) {
            anyhow::bail!("connection reset by peer");
        }
        if self.no_data.contains(&item.course_id) {
            return Ok(no_data_page());
        }
        Ok(success_page(&item.course_id, &item.term))
    }
}

/// Hands out replacement tokens in order; panics if asked for more than
/// it was scripted with.
struct ScriptedPrompt {
    tokens: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    fn with_tokens(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
        }
    }
}

impl TokenPrompt for ScriptedPrompt {
    fn initial_token(&self) -> Result<String> {
        Ok("initial".to_string())
    }

    fn reauth_token(&self) -> Result<String> {
        Ok(self.tokens.lock().unwrap().remove(0))
    }
}

// ─── Canned pages ───────────────────────────────────────────────────

fn success_page(course_id: &str, term: &str) -> RawPage {
    let body = format!(
        r#"<html><body>
            <ul><li><a class="terms-on" href="?terminfo={}&courseinfo={}">Current term</a></li></ul>
            <h2 class="course-title">COS 333 Advanced Programming Techniques</h2>
            <a class="instructor-link" href="/instructor/1">Robert Dondero</a>
            <a class="instructor-link" href="/instructor/2">Jeremie Lumbroso</a>
            <table>
                <tr><th>Quality of Course</th><th>Quality of Lectures</th><th>Recommend to Other Students</th></tr>
                <tr><td>4.5</td><td>4.2</td><td>4.8</td></tr>
            </table>
            <div class="comment">Great course, heavy workload.</div>
        </body></html>"#,
        term, course_id
    );

    RawPage {
        status: 200,
        final_url: format!(
            "https://apps.example.edu/eval?courseinfo={}&terminfo={}",
            course_id, term
        ),
        redirected: false,
        body,
    }
}

fn login_bounce() -> RawPage {
    RawPage {
        status: 200,
        final_url: "https://fed.example.edu/cas/login?service=evals".to_string(),
        redirected: true,
        body: "<html><body>Central Authentication Service</body></html>".to_string(),
    }
}

fn no_data_page() -> RawPage {
    RawPage {
        status: 200,
        final_url: "https://apps.example.edu/eval".to_string(),
        redirected: false,
        body: "<html><body>Evaluation results are not available online for this course.</body></html>"
            .to_string(),
    }
}

fn test_config(out_dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.cache.out_dir = out_dir.to_path_buf();
    cfg.evals.batch_delay_ms = 0;
    cfg
}

fn listings_of(ids: &[&str]) -> FixedListings {
    FixedListings {
        ids: ids.iter().map(|id| id.to_string()).collect(),
    }
}

fn cached_record(out_dir: &Path, term: &str, course_id: &str) -> EvaluationRecord {
    let path = cache::eval_path(out_dir, term, course_id);
    let content = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&content).unwrap()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn slice_retry_refetches_the_whole_slice() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path());
    let listings = listings_of(&["000001", "000002", "000003", "000004"]);

    // B's first fetch (under the initial token) hits an expired session
    // after A already succeeded; the retry must re-issue A and B both.
    let fetcher = ScriptedFetcher {
        dead: Some(("000002".to_string(), "t0".to_string())),
        ..ScriptedFetcher::serving_all()
    };
    let store = SessionStore::new("t0").unwrap();
    let prompt = ScriptedPrompt::with_tokens(&["t1"]);

    run_eval_sync(
        &cfg,
        &listings,
        &fetcher,
        &store,
        &prompt,
        &NoProgress,
        &["1244".to_string()],
        false,
    )
    .await
    .unwrap();

    let expected: Vec<(String, String)> = [
        ("000001", "t0"),
        ("000002", "t0"),
        ("000001", "t1"),
        ("000002", "t1"),
        ("000003", "t1"),
        ("000004", "t1"),
    ]
    .iter()
    .map(|(c, t)| (c.to_string(), t.to_string()))
    .collect();
    assert_eq!(fetcher.calls(), expected);

    for id in ["000001", "000002", "000003", "000004"] {
        assert!(
            cache::eval_path(tmp.path(), "1244", id).exists(),
            "missing cache entry for {}",
            id
        );
    }
    assert_eq!(store.current().await, "t1");
}

#[tokio::test]
async fn successful_fetch_caches_the_extracted_record() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path());
    let listings = listings_of(&["002051"]);
    let fetcher = ScriptedFetcher::serving_all();
    let store = SessionStore::new("t0").unwrap();
    let prompt = ScriptedPrompt::with_tokens(&[]);

    run_eval_sync(
        &cfg,
        &listings,
        &fetcher,
        &store,
        &prompt,
        &NoProgress,
        &["1244".to_string()],
        false,
    )
    .await
    .unwrap();

    let record = cached_record(tmp.path(), "1244", "002051");
    assert_eq!(record.course_id, "002051");
    assert_eq!(record.term, "1244");
    assert_eq!(record.course_code, "COS 333");
    assert_eq!(record.instructors.len(), 2);
    assert_eq!(record.ratings.len(), 3);
    assert_eq!(record.comments.len(), 1);
}

#[tokio::test]
async fn no_data_page_is_skipped_without_a_cache_entry() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path());
    let listings = listings_of(&["000001", "000002"]);
    let fetcher = ScriptedFetcher {
        no_data: vec!["000001".to_string()],
        ..ScriptedFetcher::serving_all()
    };
    let store = SessionStore::new("t0").unwrap();
    let prompt = ScriptedPrompt::with_tokens(&[]);

    run_eval_sync(
        &cfg,
        &listings,
        &fetcher,
        &store,
        &prompt,
        &NoProgress,
        &["1244".to_string()],
        false,
    )
    .await
    .unwrap();

    assert!(!cache::eval_path(tmp.path(), "1244", "000001").exists());
    assert!(cache::eval_path(tmp.path(), "1244", "000002").exists());
}

#[tokio::test]
async fn transport_failure_skips_only_the_failed_item() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path());
    let listings = listings_of(&["000001", "000002", "000003"]);
    let fetcher = ScriptedFetcher {
        fail: vec!["000002".to_string()],
        ..ScriptedFetcher::serving_all()
    };
    let store = SessionStore::new("t0").unwrap();
    let prompt = ScriptedPrompt::with_tokens(&[]);

    run_eval_sync(
        &cfg,
        &listings,
        &fetcher,
        &store,
        &prompt,
        &NoProgress,
        &["1244".to_string()],
        false,
    )
    .await
    .unwrap();

    assert!(cache::eval_path(tmp.path(), "1244", "000001").exists());
    assert!(!cache::eval_path(tmp.path(), "1244", "000002").exists());
    assert!(cache::eval_path(tmp.path(), "1244", "000003").exists());
}

#[tokio::test]
async fn empty_replacement_token_aborts_the_run() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path());
    let listings = listings_of(&["000001", "000002"]);
    let fetcher = ScriptedFetcher {
        dead: Some(("000002".to_string(), "t0".to_string())),
        ..ScriptedFetcher::serving_all()
    };
    let store = SessionStore::new("t0").unwrap();
    let prompt = ScriptedPrompt::with_tokens(&[""]);

    let result = run_eval_sync(
        &cfg,
        &listings,
        &fetcher,
        &store,
        &prompt,
        &NoProgress,
        &["1244".to_string()],
        false,
    )
    .await;

    assert!(result.is_err());
    // Partial state written before the abort stays on disk.
    assert!(cache::eval_path(tmp.path(), "1244", "000001").exists());
    assert!(!cache::eval_path(tmp.path(), "1244", "000002").exists());
}

#[tokio::test]
async fn duplicate_writes_from_a_retry_keep_the_cache_readable() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(tmp.path());
    let listings = listings_of(&["000001", "000002"]);
    let fetcher = ScriptedFetcher {
        dead: Some(("000002".to_string(), "t0".to_string())),
        ..ScriptedFetcher::serving_all()
    };
    let store = SessionStore::new("t0").unwrap();
    let prompt = ScriptedPrompt::with_tokens(&["t1"]);

    run_eval_sync(
        &cfg,
        &listings,
        &fetcher,
        &store,
        &prompt,
        &NoProgress,
        &["1244".to_string()],
        false,
    )
    .await
    .unwrap();

    // 000001 was fetched twice (once per slice attempt) and written once;
    // the surviving entry is the first, identical write.
    let record = cached_record(tmp.path(), "1244", "000001");
    assert_eq!(record.course_code, "COS 333");
    assert_eq!(fetcher.calls().len(), 4);
}
