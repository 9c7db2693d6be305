//! Department code listing.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;

use crate::registrar::CourseListings;
use crate::terms::TERMS;

/// Pause between listings calls when unioning every term; the listings
/// API bans IPs that hit it too fast.
const ALL_TERMS_DELAY: Duration = Duration::from_millis(1000);

/// Print department codes for one term, or the union across all known
/// terms when no term is given.
pub async fn run_print_depts(listings: &dyn CourseListings, term: Option<&str>) -> Result<()> {
    match term {
        Some(term) => {
            let codes = listings.dept_codes(term).await?;
            println!("{}", codes.join(", "));
        }
        None => {
            let mut codes = BTreeSet::new();
            for (i, term) in TERMS.iter().enumerate() {
                codes.extend(listings.dept_codes(term).await?);
                if i < TERMS.len() - 1 {
                    tokio::time::sleep(ALL_TERMS_DELAY).await;
                }
            }
            let codes: Vec<String> = codes.into_iter().collect();
            println!("{}", codes.join(", "));
        }
    }

    Ok(())
}
