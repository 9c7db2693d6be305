//! Core data types shared by the harvesting pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One unit of evaluation-scraping work: a course in a term.
///
/// Produced by the listings enumerator and consumed once per ingestion
/// pass (the same item may be fetched again when its slice is retried
/// after re-authentication).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub course_id: String,
    pub term: String,
}

impl WorkItem {
    pub fn new(course_id: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            term: term.into(),
        }
    }
}

/// A parsed course evaluation, as written to the cache.
///
/// `course_id` and `term` come from the page itself rather than the work
/// item: the evaluation site is authoritative about what it rendered.
/// Every field defaults to empty when the page is missing the markup it
/// is normally extracted from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub course_id: String,
    pub term: String,
    pub course_code: String,
    pub instructors: Vec<String>,
    pub ratings: BTreeMap<String, f64>,
    pub comments: Vec<String>,
}
