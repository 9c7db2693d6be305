//! Authenticated fetcher for the evaluation site.
//!
//! The site has no API; it is a session-cookie-protected web page. One GET
//! per work item, session cookie attached, redirects followed, and the
//! completed exchange handed back as a [`RawPage`] for classification.
//! Rate limiting lives in the ingestion controller (batch width and
//! inter-batch delay); this client only bounds each request with a timeout
//! so a stalled response turns into an error instead of a hang.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::EvalsConfig;
use crate::models::WorkItem;

/// Identifies this tool to the evaluation site's operators.
pub const USER_AGENT: &str = concat!(
    "registrar-harvest/",
    env!("CARGO_PKG_VERSION"),
    " (course data cache)"
);

/// A completed HTTP exchange, described for the classifier.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub status: u16,
    /// URL the response actually came from, after following redirects.
    pub final_url: String,
    /// Whether any redirect was followed on the way there.
    pub redirected: bool,
    pub body: String,
}

/// Fetches one evaluation page per work item.
///
/// Seam between the ingestion controller and the network; tests substitute
/// a scripted implementation.
#[async_trait]
pub trait EvalFetch: Send + Sync {
    async fn fetch_eval_page(&self, item: &WorkItem, token: &str) -> Result<RawPage>;
}

pub struct HttpEvalClient {
    client: reqwest::Client,
    base_url: String,
    cookie_name: String,
}

impl HttpEvalClient {
    pub fn new(config: &EvalsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            cookie_name: config.cookie_name.clone(),
        })
    }

    fn eval_url(&self, item: &WorkItem) -> String {
        format!(
            "{}?courseinfo={}&terminfo={}",
            self.base_url, item.course_id, item.term
        )
    }
}

#[async_trait]
impl EvalFetch for HttpEvalClient {
    async fn fetch_eval_page(&self, item: &WorkItem, token: &str) -> Result<RawPage> {
        let request_url = self.eval_url(item);

        let response = self
            .client
            .get(&request_url)
            .header(
                reqwest::header::COOKIE,
                format!("{}={}", self.cookie_name, token),
            )
            .send()
            .await
            .with_context(|| {
                format!(
                    "Request failed for course {} in term {}",
                    item.course_id, item.term
                )
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let redirected = final_url != request_url;

        let body = response.text().await.with_context(|| {
            format!(
                "Failed to read response body for course {} in term {}",
                item.course_id, item.term
            )
        })?;

        Ok(RawPage {
            status,
            final_url,
            redirected,
            body,
        })
    }
}
