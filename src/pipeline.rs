//! The review pipeline: schedule, dispatch, aggregate, sort.
//!
//! ```text
//! Vec<Sentence> ─► Scheduler ─► Dispatcher (all checkers) ─► aggregate ─► sort_rows
//! ```
//!
//! The pipeline owns no checker state. Callers build the registry, run
//! one or more reviews, then call [`CheckerRegistry::shutdown_all`] so
//! caches are persisted.

use std::sync::Arc;

use crate::aggregate::aggregate;
use crate::dispatch::Dispatcher;
use crate::models::{FlaggedRow, Sentence};
use crate::report::sort_rows;
use crate::schedule::{Scheduler, SentenceOutcome};
use crate::traits::CheckerRegistry;

/// Terminal configuration problems a review cannot start with.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("no checkers are enabled")]
    NoCheckers,
    #[error("workers must be at least 1")]
    ZeroWorkers,
    #[error("unknown checker '{0}' (known: hanspell, spacing, rule, languagetool)")]
    UnknownChecker(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ReviewOptions {
    pub workers: usize,
    pub snippet_length: usize,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            snippet_length: 60,
        }
    }
}

/// Result of one review pass, before export.
#[derive(Debug, Clone, Default)]
pub struct ReviewOutcome {
    /// Flagged rows in report order.
    pub rows: Vec<FlaggedRow>,
    /// Sentences that made it through scheduling.
    pub reviewed: usize,
    /// Per-checker count of sentences whose check failed.
    pub errors_by_checker: std::collections::BTreeMap<String, usize>,
}

pub struct Pipeline {
    dispatcher: Arc<Dispatcher>,
    options: ReviewOptions,
}

impl Pipeline {
    pub fn new(registry: Arc<CheckerRegistry>, options: ReviewOptions) -> Result<Self, ReviewError> {
        if registry.is_empty() {
            return Err(ReviewError::NoCheckers);
        }
        if options.workers == 0 {
            return Err(ReviewError::ZeroWorkers);
        }
        Ok(Self {
            dispatcher: Arc::new(Dispatcher::new(registry)),
            options,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Review sentences and return the sorted flagged rows.
    pub async fn review(&self, sentences: Vec<Sentence>) -> Vec<FlaggedRow> {
        self.review_detailed(sentences).await.rows
    }

    pub async fn review_detailed(&self, sentences: Vec<Sentence>) -> ReviewOutcome {
        if sentences.is_empty() {
            return ReviewOutcome::default();
        }

        let scheduler = Scheduler::new(self.dispatcher.clone(), self.options.workers);
        let outcomes = scheduler.run(sentences).await;

        let mut result = ReviewOutcome {
            reviewed: outcomes.len(),
            ..Default::default()
        };
        // Outcomes arrive in input order, so the stable sort below breaks
        // ties by sentence position.
        for SentenceOutcome {
            sentence, outcome, ..
        } in &outcomes
        {
            for name in &outcome.errors {
                *result.errors_by_checker.entry(name.clone()).or_insert(0) += 1;
            }
            if let Some(row) = aggregate(sentence, outcome, self.options.snippet_length) {
                result.rows.push(row);
            }
        }
        sort_rows(&mut result.rows);

        tracing::info!(
            sentences = result.reviewed,
            flagged = result.rows.len(),
            "review finished"
        );
        result
    }
}
