//! Batch ingestion progress reporting.
//!
//! Reports observable progress during `rgh cache-evals` so the operator
//! sees which term is running, how much of it is left, and when a slice
//! retry happens. Progress is emitted on **stderr** so stdout remains
//! parseable for scripts.

use std::io::Write;

/// A single progress event for an evaluation run.
#[derive(Clone, Debug)]
pub enum EvalProgressEvent {
    /// A term's work list has been enumerated; fetching begins.
    TermStarted { term: String, courses: u64 },
    /// A slice finished: n items of total are resolved for this term.
    SliceDone { term: String, n: u64, total: u64 },
    /// A slice is being retried from its starting offset after re-auth.
    SliceRetry { term: String, offset: u64 },
    /// All slices of a term are exhausted.
    TermFinished { term: String },
}

/// Reports ingestion progress. Implementations write to stderr (human or JSON).
pub trait EvalProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the ingestion controller.
    fn report(&self, event: EvalProgressEvent);
}

/// Human-friendly progress on stderr: "evals 1244  fetched  1,234 / 5,000 courses".
pub struct StderrProgress;

impl EvalProgressReporter for StderrProgress {
    fn report(&self, event: EvalProgressEvent) {
        let line = match &event {
            EvalProgressEvent::TermStarted { term, courses } => {
                format!("evals {}  starting  {} courses\n", term, format_number(*courses))
            }
            EvalProgressEvent::SliceDone { term, n, total } => {
                format!(
                    "evals {}  fetched  {} / {} courses\n",
                    term,
                    format_number(*n),
                    format_number(*total)
                )
            }
            EvalProgressEvent::SliceRetry { term, offset } => {
                format!("evals {}  retrying from index {}\n", term, offset)
            }
            EvalProgressEvent::TermFinished { term } => {
                format!("evals {}  done\n", term)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl EvalProgressReporter for JsonProgress {
    fn report(&self, event: EvalProgressEvent) {
        let obj = match &event {
            EvalProgressEvent::TermStarted { term, courses } => serde_json::json!({
                "event": "progress",
                "term": term,
                "phase": "starting",
                "courses": courses
            }),
            EvalProgressEvent::SliceDone { term, n, total } => serde_json::json!({
                "event": "progress",
                "term": term,
                "phase": "fetching",
                "n": n,
                "total": total
            }),
            EvalProgressEvent::SliceRetry { term, offset } => serde_json::json!({
                "event": "progress",
                "term": term,
                "phase": "retrying",
                "offset": offset
            }),
            EvalProgressEvent::TermFinished { term } => serde_json::json!({
                "event": "progress",
                "term": term,
                "phase": "done"
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl EvalProgressReporter for NoProgress {
    fn report(&self, _event: EvalProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse a `--progress` flag value.
    pub fn from_flag(value: &str) -> anyhow::Result<Self> {
        match value {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be off, human, or json.",
                other
            ),
        }
    }

    /// Build a reporter for this mode. Caller passes it to the controller.
    pub fn reporter(&self) -> Box<dyn EvalProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
