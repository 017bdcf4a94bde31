//! Document review orchestration.
//!
//! Coordinates the full flow for one input document: read → extract pages →
//! normalize and segment → check every sentence → sort → export. Checker
//! caches are flushed once the pipeline finishes, whether or not any row
//! was flagged.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::export;
use crate::extract::{content_type_for, extract_pages};
use crate::pipeline::{Pipeline, ReviewOptions};
use crate::report::{ReviewReport, ReviewStats};
use crate::text::{sentences_from_pages, SegmentOptions};
use crate::traits::CheckerRegistry;

/// Per-run overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct ReviewRequest {
    /// Checker names replacing the config's enabled set.
    pub checkers: Option<Vec<String>>,
    /// Worker count replacing `review.workers`.
    pub workers: Option<usize>,
}

/// Review one document and build its report.
pub async fn review_document(
    config: &Config,
    path: &Path,
    request: &ReviewRequest,
) -> Result<ReviewReport> {
    let Some(content_type) = content_type_for(path) else {
        bail!(
            "Unsupported document type: {} (expected .pdf, .docx, .pptx or .txt)",
            path.display()
        );
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes, content_type))
        .await?
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;

    let sentences = sentences_from_pages(
        &pages,
        SegmentOptions {
            korean_ratio: config.review.korean_ratio,
            min_length: config.review.min_length,
        },
    );
    tracing::info!(
        pages = pages.len(),
        sentences = sentences.len(),
        document = %path.display(),
        "document segmented"
    );
    let sentence_count = sentences.len();

    let registry = Arc::new(CheckerRegistry::from_config(
        config,
        request.checkers.as_deref(),
    )?);
    let options = ReviewOptions {
        workers: request.workers.unwrap_or(config.review.workers),
        snippet_length: config.review.snippet_length,
    };
    let pipeline = Pipeline::new(registry.clone(), options)?;

    let outcome = pipeline.review_detailed(sentences).await;
    registry.shutdown_all().await;

    let mut stats = ReviewStats::tally(pages.len(), sentence_count, &outcome.rows);
    stats.errors_by_checker = outcome.errors_by_checker;

    Ok(ReviewReport {
        document: path.display().to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        checkers: registry.names(),
        stats,
        rows: outcome.rows,
    })
}

/// The `check` command: review, export, summarize.
pub async fn run_review(
    config: &Config,
    path: &Path,
    request: &ReviewRequest,
    output: Option<&Path>,
) -> Result<()> {
    let report = review_document(config, path, request).await?;
    export::write_report(&report, output)?;
    if output.is_some() {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &ReviewReport) {
    let stats = &report.stats;
    println!("review {}", report.document);
    println!("  checkers:  {}", report.checkers.join(", "));
    println!("  pages:     {}", stats.pages);
    println!("  sentences: {}", stats.sentences);
    println!(
        "  flagged:   {} ({:.1}%)",
        stats.flagged,
        stats.flag_rate * 100.0
    );

    if !stats.by_checker.is_empty() {
        println!();
        println!("  {:<16} {:>8} {:>8}", "CHECKER", "FLAGGED", "ERRORS");
        for name in &report.checkers {
            println!(
                "  {:<16} {:>8} {:>8}",
                name,
                stats.by_checker.get(name).copied().unwrap_or(0),
                stats.errors_by_checker.get(name).copied().unwrap_or(0)
            );
        }
    }
}
