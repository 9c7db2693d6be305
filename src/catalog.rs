//! Client for the university catalog API (course data and seat details).
//!
//! The main source for course information, short of course IDs (cheaper
//! from the listings API) and evaluations (web-scraped, sadly). It is slow
//! and its performance fluctuates; the caching flows proxy its output to
//! disk rather than hitting it live. Requires a service-account API key.
//!
//! Records pass through as raw JSON: the cache stores what the API said,
//! not an interpretation of it.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::config::CatalogConfig;
use crate::eval_client::USER_AGENT;

/// Environment variable carrying the catalog API key.
pub const API_KEY_ENV_VAR: &str = "OIT_API_KEY";

pub struct CatalogClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("Catalog API key is required");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
        })
    }

    /// Build a client from the `OIT_API_KEY` environment variable.
    /// Fatal when missing; there is no interactive fallback for this key.
    pub fn from_env(config: &CatalogConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV_VAR)
            .map_err(|_| anyhow::anyhow!("{} is required", API_KEY_ENV_VAR))?;
        Self::new(config, api_key)
    }

    /// All course records a department lists in a term. Empty when the
    /// department has nothing listed.
    pub async fn dept_courses(&self, dept: &str, term: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}courses/courses?fmt=json&term={}&subject={}",
            self.api_url, term, dept
        );
        let body = self.get_json(&url).await.with_context(|| {
            format!("Failed to fetch courses for department {} in term {}", dept, term)
        })?;

        Ok(dept_course_records(&body))
    }

    /// The detail record for one course in a term, as raw JSON.
    pub async fn course_details(&self, course_id: &str, term: &str) -> Result<Value> {
        let url = format!(
            "{}courses/details?fmt=json&term={}&course_id={}",
            self.api_url, term, course_id
        );
        let body = self.get_json(&url).await.with_context(|| {
            format!("Failed to fetch details for course {} in term {}", course_id, term)
        })?;

        Ok(detail_record(body))
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("Catalog API returned HTTP {}", response.status());
        }

        Ok(response.json().await?)
    }
}

// Course lists nest under term[0].subjects[0].courses; a missing level
// means the department listed nothing this term.
fn dept_course_records(body: &Value) -> Vec<Value> {
    body.pointer("/term/0/subjects/0/courses")
        .and_then(|c| c.as_array())
        .cloned()
        .unwrap_or_default()
}

// Details nest under course_details.course_detail; fall back to the whole
// payload when the wrapper is absent.
fn detail_record(body: Value) -> Value {
    if let Some(detail) = body.pointer("/course_details/course_detail") {
        return detail.clone();
    }
    body
}
