//! Checker inspection commands: list the built-in checkers and run one
//! sentence through the active set.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::aggregate::aggregate;
use crate::config::Config;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::models::{CheckVerdict, FlaggedRow, Sentence, HANSPELL, LANGUAGETOOL, RULE, SPACING};
use crate::text::normalize_text;
use crate::traits::{CheckerRegistry, CheckerStatus};

const BUILTIN: [&str; 4] = [HANSPELL, SPACING, RULE, LANGUAGETOOL];

fn enabled_in_config(config: &Config, name: &str) -> bool {
    let checkers = &config.checkers;
    match name {
        HANSPELL => checkers.hanspell.enabled,
        SPACING => checkers.spacing.enabled,
        RULE => checkers.rule.enabled,
        LANGUAGETOOL => checkers.languagetool.enabled,
        _ => false,
    }
}

/// One line of `kproof checkers` output.
#[derive(Debug, Clone, Serialize)]
pub struct CheckerInfo {
    pub name: String,
    pub enabled: bool,
    pub status: CheckerStatus,
    pub description: String,
}

pub fn describe_checkers(config: &Config) -> Result<Vec<CheckerInfo>> {
    let all: Vec<String> = BUILTIN.iter().map(|s| s.to_string()).collect();
    let registry = CheckerRegistry::from_config(config, Some(&all))?;

    Ok(registry
        .checkers()
        .iter()
        .map(|checker| CheckerInfo {
            name: checker.name().to_string(),
            enabled: enabled_in_config(config, checker.name()),
            status: checker.status(),
            description: checker.description().to_string(),
        })
        .collect())
}

pub fn list_checkers(config: &Config) -> Result<()> {
    let infos = describe_checkers(config)?;

    println!("{:<14} {:<8} {:<30} DESCRIPTION", "CHECKER", "ENABLED", "STATUS");
    for info in &infos {
        let status = match &info.status {
            CheckerStatus::Ready => "ready".to_string(),
            CheckerStatus::Unavailable(reason) => format!("unavailable: {}", reason),
        };
        println!(
            "{:<14} {:<8} {:<30} {}",
            info.name, info.enabled, status, info.description
        );
    }
    Ok(())
}

/// Every checker's verdict for one sentence, plus the row it would produce.
#[derive(Debug, Clone, Serialize)]
pub struct SentenceReport {
    pub sentence: String,
    pub verdicts: Vec<NamedVerdict>,
    pub row: Option<FlaggedRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedVerdict {
    pub checker: String,
    #[serde(flatten)]
    pub verdict: CheckVerdict,
}

pub async fn check_sentence(
    config: &Config,
    text: &str,
    only: Option<&[String]>,
) -> Result<SentenceReport> {
    let registry = Arc::new(CheckerRegistry::from_config(config, only)?);
    let dispatcher = Dispatcher::new(registry.clone());

    let sentence = Sentence::new(1, normalize_text(text));
    let verdicts = dispatcher.verdicts(&sentence.text).await;
    registry.shutdown_all().await;

    let outcome = DispatchOutcome::from_verdicts(verdicts.clone());
    let row = aggregate(&sentence, &outcome, config.review.snippet_length);

    Ok(SentenceReport {
        sentence: sentence.text,
        verdicts: verdicts
            .into_iter()
            .map(|(checker, verdict)| NamedVerdict { checker, verdict })
            .collect(),
        row,
    })
}

pub async fn run_sentence(config: &Config, text: &str, only: Option<&[String]>) -> Result<()> {
    let report = check_sentence(config, text, only).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
