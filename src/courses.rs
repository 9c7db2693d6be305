//! Catalog caching flow: department course listings and per-course details.
//!
//! Simpler than the evaluation harvest: the catalog API is authenticated
//! with a stable key, so there is no session to lose. Requests run
//! sequentially; the only pacing is a pause between terms.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::cache::{self, WriteOutcome};
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::registrar::CourseListings;
use crate::terms::TERMS;

/// Cache department listings and course details for `terms` (all known
/// terms when empty) and `depts` (every enumerated department when empty).
pub async fn run_course_sync(
    config: &Config,
    listings: &dyn CourseListings,
    catalog: &CatalogClient,
    terms: &[String],
    depts: &[String],
    force: bool,
) -> Result<()> {
    let terms: Vec<String> = if terms.is_empty() {
        TERMS.iter().map(|t| t.to_string()).collect()
    } else {
        terms.to_vec()
    };
    let term_delay = Duration::from_millis(config.catalog.term_delay_ms);

    for (i, term) in terms.iter().enumerate() {
        let all_depts = listings.dept_codes(term).await?;
        let depts: Vec<String> = if depts.is_empty() {
            all_depts
        } else {
            if depts.iter().any(|d| !all_depts.contains(d)) {
                bail!(
                    "Invalid department codes provided. Valid codes are: {}",
                    all_depts.join(", ")
                );
            }
            depts.to_vec()
        };

        println!(
            "Fetching courses for term {}. {} departments found.",
            term,
            depts.len()
        );

        for dept in &depts {
            let dept_courses = catalog.dept_courses(dept, term).await?;
            if dept_courses.is_empty() {
                println!("No courses found for department {}.", dept);
                continue;
            }

            println!(
                "Found {} courses for department {}.",
                dept_courses.len(),
                dept
            );
            let listing_path = cache::dept_courses_path(&config.cache.out_dir, term, dept);
            report_write(
                &listing_path,
                cache::write_json(&listing_path, &dept_courses, force)?,
            );

            for course in &dept_courses {
                let course_id = match course.get("course_id").and_then(|v| v.as_str()) {
                    Some(id) => id,
                    None => {
                        println!("Skipping a course in {} with no course_id.", dept);
                        continue;
                    }
                };

                let details = catalog.course_details(course_id, term).await?;
                let detail_path =
                    cache::course_detail_path(&config.cache.out_dir, term, course_id);
                report_write(
                    &detail_path,
                    cache::write_json(&detail_path, &details, force)?,
                );
            }
        }

        println!("Finished fetching courses for term {}.", term);
        if terms.len() > 1 && i < terms.len() - 1 {
            tokio::time::sleep(term_delay).await;
        }
    }

    Ok(())
}

fn report_write(path: &Path, outcome: WriteOutcome) {
    match outcome {
        WriteOutcome::Written => {}
        WriteOutcome::SkippedExisting => {
            println!("WARNING: {} already exists. Skipping.", path.display())
        }
        WriteOutcome::Overwritten => {
            println!("WARNING: {} already exists. Overwriting.", path.display())
        }
    }
}
