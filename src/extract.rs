//! Record extraction from a fetched evaluation page.
//!
//! The evaluation site renders one fixed layout; this module knows that
//! layout and nothing else. Extraction is total: every field is pulled
//! independently and defaults to empty (or zero) when its markup is
//! missing or malformed, so one odd page can never abort a batch.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::models::EvaluationRecord;

// The fixed page layout, as CSS selectors.
const ACTIVE_TERM_LINK: &str = "a.terms-on";
const COURSE_TITLE: &str = "h2.course-title";
const INSTRUCTOR_LINK: &str = "a.instructor-link";
const RESULTS_TABLE: &str = "table";
const TABLE_ROW: &str = "tr";
const TABLE_CELL: &str = "th, td";
const COMMENT_BLOCK: &str = "div.comment";

// Selectors are static literals; parsing one can only fail if the literal
// itself is malformed.
fn selector(src: &str) -> Selector {
    Selector::parse(src).unwrap()
}

/// Extract a typed [`EvaluationRecord`] from a successfully fetched page.
///
/// The `courseinfo`/`terminfo` query parameters embedded in the active
/// term link are treated as ground truth for the record's identifiers:
/// the page knows what it rendered better than the caller does.
pub fn parse_eval_page(doc: &Html) -> EvaluationRecord {
    let (course_id, term) = active_term_params(doc);

    EvaluationRecord {
        course_id,
        term,
        course_code: course_code(doc),
        instructors: instructor_names(doc),
        ratings: ratings_table(doc),
        comments: comment_blocks(doc),
    }
}

/// Pull `(courseinfo, terminfo)` out of the active term link's href.
fn active_term_params(doc: &Html) -> (String, String) {
    let href = doc
        .select(&selector(ACTIVE_TERM_LINK))
        .next()
        .and_then(|el| el.value().attr("href"))
        .unwrap_or("");

    let query = href.split_once('?').map(|(_, q)| q).unwrap_or("");

    let mut course_id = String::new();
    let mut term = String::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "courseinfo" => course_id = value.into_owned(),
            "terminfo" => term = value.into_owned(),
            _ => {}
        }
    }

    (course_id, term)
}

/// The title reads `<DEPT> <NUMBER> <descriptive title>`; the course code
/// is the first two tokens. The descriptive title is not part of the
/// record.
fn course_code(doc: &Html) -> String {
    let title = doc
        .select(&selector(COURSE_TITLE))
        .next()
        .map(element_text)
        .unwrap_or_default();

    let mut tokens = title.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(dept), Some(number)) => format!("{} {}", dept, number),
        _ => String::new(),
    }
}

fn instructor_names(doc: &Html) -> Vec<String> {
    doc.select(&selector(INSTRUCTOR_LINK))
        .map(|el| element_text(el))
        .filter(|name| !name.is_empty())
        .collect()
}

/// First results table: row one is category labels, row two is scores.
/// Labels and scores are zipped to the shorter of the two rows; surplus
/// cells on either side are dropped. Scores that fail to parse count as 0.
fn ratings_table(doc: &Html) -> BTreeMap<String, f64> {
    let row_sel = selector(TABLE_ROW);
    let cell_sel = selector(TABLE_CELL);

    let table = match doc.select(&selector(RESULTS_TABLE)).next() {
        Some(table) => table,
        None => return BTreeMap::new(),
    };

    let mut rows = table.select(&row_sel);
    let labels: Vec<String> = match rows.next() {
        Some(row) => row.select(&cell_sel).map(element_text).collect(),
        None => return BTreeMap::new(),
    };
    let values: Vec<String> = match rows.next() {
        Some(row) => row.select(&cell_sel).map(element_text).collect(),
        None => return BTreeMap::new(),
    };

    labels
        .into_iter()
        .zip(values)
        .map(|(label, value)| (label, value.parse::<f64>().unwrap_or(0.0)))
        .collect()
}

fn comment_blocks(doc: &Html) -> Vec<String> {
    doc.select(&selector(COMMENT_BLOCK))
        .map(|el| element_text(el))
        .collect()
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
