//! Report ordering and run summary.
//!
//! Rows a rule flagged come first, then rows several checkers agreed on,
//! then everything else; ties break by page and then by the joined
//! source list. The sort is stable, so equal rows keep their input order.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{FlaggedRow, RULE};

const RULE_PRIORITY: u32 = 100;
const MULTI_SOURCE_PRIORITY: u32 = 10;

/// Review priority of a row. Higher sorts first.
pub fn priority(row: &FlaggedRow) -> u32 {
    let mut score = 0;
    if row.sources.iter().any(|s| s == RULE) {
        score += RULE_PRIORITY;
    }
    if row.sources.len() > 1 {
        score += MULTI_SOURCE_PRIORITY;
    }
    score
}

pub fn sort_rows(rows: &mut [FlaggedRow]) {
    rows.sort_by_cached_key(|row| {
        (
            std::cmp::Reverse(priority(row)),
            row.page,
            row.sources_label(),
        )
    });
}

/// Counts for one review run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewStats {
    pub pages: usize,
    pub sentences: usize,
    pub flagged: usize,
    /// `flagged / sentences`, or 0 when there were no sentences.
    pub flag_rate: f64,
    /// Rows each checker contributed to.
    pub by_checker: BTreeMap<String, usize>,
    /// Sentences each checker failed on.
    pub errors_by_checker: BTreeMap<String, usize>,
}

impl ReviewStats {
    pub fn tally(pages: usize, sentences: usize, rows: &[FlaggedRow]) -> Self {
        let mut by_checker = BTreeMap::new();
        for row in rows {
            for source in &row.sources {
                *by_checker.entry(source.clone()).or_insert(0) += 1;
            }
        }
        let flag_rate = if sentences == 0 {
            0.0
        } else {
            rows.len() as f64 / sentences as f64
        };
        Self {
            pages,
            sentences,
            flagged: rows.len(),
            flag_rate,
            by_checker,
            errors_by_checker: BTreeMap::new(),
        }
    }
}

/// The full result of reviewing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub document: String,
    pub generated_at: String,
    pub checkers: Vec<String>,
    pub stats: ReviewStats,
    pub rows: Vec<FlaggedRow>,
}
