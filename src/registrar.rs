//! Client for the registrar's public course listings API.
//!
//! This API rate-limits aggressively and will (at least temporarily) ban
//! an IP that spams it, but it is the only convenient source for the set
//! of course IDs in a term. Keep it to enumeration; everything else comes
//! from the catalog API or the evaluation site.
//!
//! There is no issued credential: the public course-offerings page embeds
//! a short-lived `apiToken` in its markup, and listings calls replay it
//! as a bearer token.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::RegistrarConfig;
use crate::eval_client::USER_AGENT;

/// Term/department enumeration, as consumed by the caching flows.
///
/// Outputs are ground truth for the flows: deduplicated, sorted, and not
/// validated further.
#[async_trait]
pub trait CourseListings: Send + Sync {
    /// Course IDs listed for a term, deduplicated and sorted.
    async fn listing_ids(&self, term: &str) -> Result<Vec<String>>;

    /// Department codes listed for a term, deduplicated and sorted.
    async fn dept_codes(&self, term: &str) -> Result<Vec<String>>;
}

pub struct RegistrarClient {
    client: reqwest::Client,
    api_url: String,
    token_url: String,
}

impl RegistrarClient {
    pub fn new(config: &RegistrarConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token_url: config.token_url.clone(),
        })
    }

    async fn bearer_token(&self) -> Result<String> {
        let page = self
            .client
            .get(&self.token_url)
            .send()
            .await
            .context("Failed to fetch the course-offerings page")?
            .text()
            .await
            .context("Failed to read the course-offerings page")?;

        Ok(format!("Bearer {}", extract_api_token(&page)?))
    }

    async fn class_records(&self, term: &str) -> Result<Vec<Value>> {
        let token = self.bearer_token().await?;
        let url = format!("{}{}", self.api_url, term);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .with_context(|| format!("Failed to fetch course list for term {}", term))?;

        if !response.status().is_success() {
            bail!(
                "Failed to fetch course list for term {}: HTTP {}",
                term,
                response.status()
            );
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to decode course list for term {}", term))?;

        class_list(&body)
    }
}

#[async_trait]
impl CourseListings for RegistrarClient {
    async fn listing_ids(&self, term: &str) -> Result<Vec<String>> {
        let records = self.class_records(term).await?;
        Ok(unique_sorted_field(&records, "course_id"))
    }

    async fn dept_codes(&self, term: &str) -> Result<Vec<String>> {
        let records = self.class_records(term).await?;
        Ok(unique_sorted_field(&records, "subject"))
    }
}

fn extract_api_token(page: &str) -> Result<String> {
    const MARKER: &str = "apiToken\":\"";

    let start = page
        .find(MARKER)
        .context("No apiToken found in the course-offerings page")?;
    let rest = &page[start + MARKER.len()..];
    let end = rest
        .find('"')
        .context("Unterminated apiToken in the course-offerings page")?;

    Ok(rest[..end].to_string())
}

// The listings payload nests the class array under classes.class; anything
// else means the API changed shape.
fn class_list(body: &Value) -> Result<Vec<Value>> {
    body.get("classes")
        .and_then(|c| c.get("class"))
        .and_then(|c| c.as_array())
        .cloned()
        .context("Invalid course list response format")
}

fn unique_sorted_field(records: &[Value], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get(field).and_then(|v| v.as_str()))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
