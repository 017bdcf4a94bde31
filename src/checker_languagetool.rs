//! Grammar checker backed by a LanguageTool server.
//!
//! Calls `POST {url}/v2/check` with the sentence and language. Every match
//! the server returns counts toward flagging; only matches that carry at
//! least one replacement contribute a suggestion (their first one).
//! No cache: grammar servers are typically local and cheap to query.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::LanguageToolConfig;
use crate::models::{CheckVerdict, Hit, LANGUAGETOOL};
use crate::rate_limit::RateLimiter;
use crate::traits::Checker;

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<GrammarMatch>,
}

/// One issue reported by the grammar server.
#[derive(Debug, Clone, Deserialize)]
pub struct GrammarMatch {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub rule: Option<GrammarRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Replacement {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrammarRule {
    pub id: String,
}

/// Build a verdict from the server's matches.
pub fn verdict_from_matches(matches: &[GrammarMatch]) -> CheckVerdict {
    if matches.is_empty() {
        return CheckVerdict::clean();
    }

    let hits: Vec<Hit> = matches
        .iter()
        .filter_map(|m| {
            let first = m.replacements.first()?;
            let label = match &m.rule {
                Some(rule) => rule.id.clone(),
                None => m.message.clone(),
            };
            Some(Hit {
                label,
                hint: first.value.clone(),
            })
        })
        .collect();

    let mut metadata = Map::new();
    metadata.insert("match_count".to_string(), Value::from(matches.len()));

    CheckVerdict {
        flagged: true,
        suggestion: None,
        suggestions: Some(hits),
        metadata,
    }
}

pub struct LanguageToolChecker {
    client: reqwest::Client,
    url: String,
    language: String,
    limiter: Option<RateLimiter>,
}

impl LanguageToolChecker {
    pub fn from_config(config: &LanguageToolConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            limiter: config.rate_limit_per_sec.map(RateLimiter::per_second),
        })
    }

    async fn fetch_matches(&self, sentence: &str) -> Result<Vec<GrammarMatch>> {
        let endpoint = format!("{}/v2/check", self.url);
        let response = self
            .client
            .post(&endpoint)
            .form(&[("text", sentence), ("language", self.language.as_str())])
            .send()
            .await
            .with_context(|| format!("LanguageTool unreachable at {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("LanguageTool error {}: {}", status, body));
        }

        let parsed: CheckResponse = response.json().await?;
        Ok(parsed.matches)
    }
}

#[async_trait]
impl Checker for LanguageToolChecker {
    fn name(&self) -> &str {
        LANGUAGETOOL
    }

    fn description(&self) -> &str {
        "Grammar and style matches from a LanguageTool server"
    }

    async fn check(&self, sentence: &str) -> CheckVerdict {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        match self.fetch_matches(sentence).await {
            Ok(matches) => verdict_from_matches(&matches),
            Err(e) => {
                tracing::debug!("languagetool call failed: {:#}", e);
                CheckVerdict::failed(format!("{:#}", e))
            }
        }
    }
}
