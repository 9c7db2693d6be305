//! Classification of completed evaluation-page fetches.
//!
//! A fetch that came back over the wire lands in exactly one
//! [`FetchOutcome`] bucket. The rules are ordered; the first match wins:
//!
//! 1. redirected to the SSO login page → the session expired
//! 2. redirected anywhere else → unexpected, reported and skipped
//! 3. non-2xx status → transport error
//! 4. body carries the "no evaluation" sentinel → nothing to extract
//! 5. otherwise → success, body parsed into a queryable document
//!
//! Pure function of the response; no I/O here.

use scraper::Html;

use crate::eval_client::RawPage;

/// Path fragment that marks the SSO login page a dead session gets
/// bounced to.
const LOGIN_PATH_MARKER: &str = "login";

/// Fixed phrase the site renders when a course has no published
/// evaluation for the requested term.
const NO_EVAL_SENTINEL: &str = "not available online";

/// The one true outcome of a single fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Page fetched and parsed; ready for record extraction.
    Success(Html),
    /// The session cookie is no longer valid.
    SessionExpired { redirect_url: String },
    /// Redirected somewhere that is not the login page.
    Redirected { url: String },
    /// HTTP-level failure (non-2xx).
    TransportError { message: String },
    /// Page loaded but explicitly reports no evaluation data.
    NoData { message: String },
}

/// Sort a completed response into its [`FetchOutcome`].
pub fn classify(page: RawPage) -> FetchOutcome {
    if page.redirected && is_login_url(&page.final_url) {
        return FetchOutcome::SessionExpired {
            redirect_url: page.final_url,
        };
    }

    if page.redirected {
        return FetchOutcome::Redirected {
            url: page.final_url,
        };
    }

    if !(200..300).contains(&page.status) {
        return FetchOutcome::TransportError {
            message: status_text(page.status),
        };
    }

    if page.body.contains(NO_EVAL_SENTINEL) {
        return FetchOutcome::NoData {
            message: "evaluation results not available online".to_string(),
        };
    }

    FetchOutcome::Success(Html::parse_document(&page.body))
}

fn is_login_url(final_url: &str) -> bool {
    match url::Url::parse(final_url) {
        Ok(parsed) => parsed.path().contains(LOGIN_PATH_MARKER),
        // Not a parseable absolute URL; fall back to a substring check.
        Err(_) => final_url.contains(LOGIN_PATH_MARKER),
    }
}

fn status_text(status: u16) -> String {
    match reqwest::StatusCode::from_u16(status) {
        Ok(code) => match code.canonical_reason() {
            Some(reason) => format!("HTTP {} {}", status, reason),
            None => format!("HTTP {}", status),
        },
        Err(_) => format!("HTTP {}", status),
    }
}
