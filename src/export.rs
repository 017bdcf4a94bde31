//! Write a review report as JSON.
//!
//! With an output path the report goes to that file (parent directories are
//! created). Without one it is printed to stdout for piping.

use anyhow::{Context, Result};
use std::path::Path;

use crate::report::ReviewReport;

pub fn write_report(report: &ReviewReport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            tracing::info!(
                rows = report.rows.len(),
                path = %path.display(),
                "report written"
            );
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}
