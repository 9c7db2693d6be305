//! Evaluation-cache statistics.
//!
//! A quick read-side summary of what a harvest produced: how many records
//! are cached per term and which rating categories appear, with counts.
//! Used by `rgh stats` to sanity-check a run without opening files by hand.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::EvaluationRecord;

#[derive(Debug, Default)]
struct CacheStats {
    records: u64,
    unreadable: u64,
    per_term: BTreeMap<String, u64>,
    categories: BTreeMap<String, u64>,
}

/// Run the stats command: scan the evaluation cache and print a summary.
pub fn run_stats(config: &Config, terms: &[String]) -> Result<()> {
    let evals_dir = config.cache.out_dir.join("evals");
    if !evals_dir.exists() {
        println!("No evaluation cache at {}", evals_dir.display());
        return Ok(());
    }

    let stats = collect_stats(&evals_dir, terms)?;

    println!("Registrar Harvest — Evaluation Cache Stats");
    println!("==========================================");
    println!();
    println!("  Cache:      {}", evals_dir.display());
    println!("  Records:    {}", stats.records);
    if stats.unreadable > 0 {
        println!("  Unreadable: {}", stats.unreadable);
    }

    if !stats.per_term.is_empty() {
        println!();
        println!("  By term:");
        println!("  {:<12} {:>8}", "TERM", "RECORDS");
        println!("  {}", "-".repeat(21));
        for (term, count) in &stats.per_term {
            println!("  {:<12} {:>8}", term, count);
        }
    }

    if !stats.categories.is_empty() {
        // Most common categories first; ties break alphabetically.
        let mut sorted: Vec<(&String, &u64)> = stats.categories.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        println!();
        println!("  Rating categories:");
        println!("  {:<40} {:>8}", "CATEGORY", "COUNT");
        println!("  {}", "-".repeat(49));
        for (category, count) in sorted {
            println!("  {:<40} {:>8}", category, count);
        }
    }

    println!();

    Ok(())
}

fn collect_stats(evals_dir: &Path, terms: &[String]) -> Result<CacheStats> {
    let mut stats = CacheStats::default();

    for entry in WalkDir::new(evals_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        // Cache layout puts each record under its term's directory.
        let term = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !terms.is_empty() && !terms.contains(&term) {
            continue;
        }

        let content = match std::fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(_) => {
                stats.unreadable += 1;
                continue;
            }
        };
        let record: EvaluationRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(_) => {
                stats.unreadable += 1;
                continue;
            }
        };

        stats.records += 1;
        *stats.per_term.entry(term).or_insert(0) += 1;
        for category in record.ratings.keys() {
            *stats.categories.entry(category.clone()).or_insert(0) += 1;
        }
    }

    Ok(stats)
}
