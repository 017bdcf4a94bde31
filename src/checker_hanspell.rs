//! Dictionary/API-backed spell checker.
//!
//! Sends each sentence to a spell-correction service and flags it when the
//! corrected text differs from the input. Verdicts are cached per sentence
//! (flagged and clean alike) and calls are rate limited, since the service
//! is remote and throttled.
//!
//! # Service contract
//!
//! `POST <endpoint>` with JSON `{"text": "<sentence>"}`. The reply is a
//! JSON object carrying the corrected sentence in `checked`, or in
//! `result` for older service versions.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResultCache;
use crate::config::HanspellConfig;
use crate::models::{CheckVerdict, HANSPELL};
use crate::rate_limit::RateLimiter;
use crate::traits::{Checker, CheckerStatus};

/// A backend that returns the corrected form of a sentence.
#[async_trait]
pub trait SpellService: Send + Sync {
    async fn correct(&self, sentence: &str) -> Result<String>;
}

/// [`SpellService`] over HTTP.
pub struct HttpSpellService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSpellService {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl SpellService for HttpSpellService {
    async fn correct(&self, sentence: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": sentence }))
            .send()
            .await
            .with_context(|| format!("spell service unreachable at {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("spell service error {}: {}", status, body));
        }

        let json: Value = response.json().await?;
        parse_corrected(&json)
    }
}

/// Extract the corrected sentence from a service reply.
fn parse_corrected(json: &Value) -> Result<String> {
    json.get("checked")
        .or_else(|| json.get("result"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("invalid spell service response: missing 'checked'"))
}

pub struct HanspellChecker {
    service: Option<Arc<dyn SpellService>>,
    cache: ResultCache,
    limiter: RateLimiter,
}

impl HanspellChecker {
    pub fn new(service: Arc<dyn SpellService>, cache: ResultCache, limiter: RateLimiter) -> Self {
        Self {
            service: Some(service),
            cache,
            limiter,
        }
    }

    /// Build from config. Without an endpoint the checker stays registered
    /// but reports itself unavailable and never flags.
    pub fn from_config(config: &HanspellConfig, cache_path: &Path) -> Result<Self> {
        let service: Option<Arc<dyn SpellService>> = match &config.endpoint {
            Some(endpoint) => Some(Arc::new(HttpSpellService::new(
                endpoint,
                config.timeout_secs,
            )?)),
            None => {
                tracing::warn!("hanspell enabled without checkers.hanspell.endpoint; it will not flag anything");
                None
            }
        };

        Ok(Self {
            service,
            cache: ResultCache::load(cache_path),
            limiter: RateLimiter::per_second(config.rate_limit_per_sec),
        })
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

#[async_trait]
impl Checker for HanspellChecker {
    fn name(&self) -> &str {
        HANSPELL
    }

    fn description(&self) -> &str {
        "Spelling corrections from a remote spell-check service"
    }

    fn status(&self) -> CheckerStatus {
        match self.service {
            Some(_) => CheckerStatus::Ready,
            None => CheckerStatus::Unavailable("no endpoint configured".to_string()),
        }
    }

    async fn check(&self, sentence: &str) -> CheckVerdict {
        let Some(service) = &self.service else {
            return CheckVerdict::failed("spell service not configured");
        };

        self.cache
            .get_or_compute(sentence, || async move {
                self.limiter.acquire().await;

                let corrected = match service.correct(sentence).await {
                    Ok(corrected) => corrected,
                    Err(e) => {
                        tracing::debug!("hanspell call failed: {:#}", e);
                        return CheckVerdict::failed(format!("{:#}", e));
                    }
                };

                let flagged = corrected != sentence;
                let mut metadata = Map::new();
                metadata.insert("original".to_string(), Value::from(sentence));
                metadata.insert("corrected".to_string(), Value::from(corrected.as_str()));
                metadata.insert(
                    "timestamp".to_string(),
                    Value::from(chrono::Utc::now().to_rfc3339()),
                );

                CheckVerdict {
                    flagged,
                    suggestion: flagged.then_some(corrected),
                    suggestions: None,
                    metadata,
                }
            })
            .await
    }

    async fn shutdown(&self) {
        self.cache.flush();
    }
}
