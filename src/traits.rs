//! Checker capability contract and registry.
//!
//! Every checker, built-in or custom, implements [`Checker`]. The
//! [`CheckerRegistry`] holds the active set in a fixed order; that order is
//! the order of `sources` in every report row.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               CheckerRegistry                │
//! │  ┌─────────┐ ┌─────────┐ ┌──────┐ ┌───────┐  │
//! │  │hanspell │ │ spacing │ │ rule │ │  lt   │  │
//! │  │cache+rl │ │  cache  │ │      │ │ (rl)  │  │
//! │  └─────────┘ └─────────┘ └──────┘ └───────┘  │
//! └──────────────┬───────────────────────────────┘
//!                ▼
//!        Dispatcher → Scheduler → Aggregator
//! ```
//!
//! # Usage
//!
//! ```rust
//! use kproof::traits::CheckerRegistry;
//!
//! let mut checkers = CheckerRegistry::new();
//! // checkers.register(Arc::new(MyChecker::new()))?;
//! assert!(checkers.is_empty());
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::checker_hanspell::HanspellChecker;
use crate::checker_languagetool::LanguageToolChecker;
use crate::checker_rule::RuleChecker;
use crate::checker_spacing::SpacingChecker;
use crate::config::Config;
use crate::models::{CheckVerdict, HANSPELL, LANGUAGETOOL, RULE, SPACING};
use crate::pipeline::ReviewError;

/// Whether a checker can currently reach its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum CheckerStatus {
    Ready,
    Unavailable(String),
}

/// A pluggable unit that evaluates one sentence.
///
/// # Contract
///
/// - [`check`](Checker::check) never fails. Network errors, missing
///   backends and bad patterns are reported as a non-flag verdict built
///   with [`CheckVerdict::failed`]. A broken checker reduces coverage; it
///   must not abort the run.
/// - [`shutdown`](Checker::shutdown) is called once at the end of a run
///   to flush persistent state. It must tolerate being called twice and
///   being called when `check` never ran.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use kproof::models::CheckVerdict;
/// use kproof::traits::Checker;
///
/// pub struct ExclamationChecker;
///
/// #[async_trait]
/// impl Checker for ExclamationChecker {
///     fn name(&self) -> &str { "exclamation" }
///     fn description(&self) -> &str { "Flags sentences ending in '!!'" }
///
///     async fn check(&self, sentence: &str) -> CheckVerdict {
///         CheckVerdict { flagged: sentence.ends_with("!!"), ..Default::default() }
///     }
/// }
/// ```
#[async_trait]
pub trait Checker: Send + Sync {
    /// Stable short identifier, unique within a registry.
    fn name(&self) -> &str;

    /// One-line description for `kproof checkers`.
    fn description(&self) -> &str;

    fn status(&self) -> CheckerStatus {
        CheckerStatus::Ready
    }

    /// Evaluate one sentence.
    async fn check(&self, sentence: &str) -> CheckVerdict;

    /// Flush persistent state. The default does nothing.
    async fn shutdown(&self) {}
}

/// Ordered set of active checkers.
pub struct CheckerRegistry {
    checkers: Vec<Arc<dyn Checker>>,
}

impl CheckerRegistry {
    /// Create an empty checker registry.
    pub fn new() -> Self {
        Self {
            checkers: Vec::new(),
        }
    }

    /// Create a registry with every built-in checker enabled in `config`.
    ///
    /// `only`, when given, replaces the config's enabled flags: exactly the
    /// named checkers are built, in the fixed built-in order. Unknown names
    /// are rejected.
    pub fn from_config(config: &Config, only: Option<&[String]>) -> Result<Self> {
        const BUILTIN: [&str; 4] = [HANSPELL, SPACING, RULE, LANGUAGETOOL];

        if let Some(names) = only {
            for name in names {
                if !BUILTIN.contains(&name.as_str()) {
                    return Err(ReviewError::UnknownChecker(name.clone()).into());
                }
            }
        }

        let enabled = |name: &str, from_config: bool| match only {
            Some(names) => names.iter().any(|n| n == name),
            None => from_config,
        };

        let cache_dir = config.review.cache_dir.as_path();
        let checkers = &config.checkers;
        let mut registry = Self::new();

        if enabled(HANSPELL, checkers.hanspell.enabled) {
            registry.register(Arc::new(HanspellChecker::from_config(
                &checkers.hanspell,
                &cache_path(cache_dir, HANSPELL),
            )?))?;
        }
        if enabled(SPACING, checkers.spacing.enabled) {
            registry.register(Arc::new(SpacingChecker::from_config(
                &checkers.spacing,
                &cache_path(cache_dir, SPACING),
            )))?;
        }
        if enabled(RULE, checkers.rule.enabled) {
            registry.register(Arc::new(RuleChecker::from_config(&checkers.rule)))?;
        }
        if enabled(LANGUAGETOOL, checkers.languagetool.enabled) {
            registry.register(Arc::new(LanguageToolChecker::from_config(
                &checkers.languagetool,
            )?))?;
        }

        Ok(registry)
    }

    /// Register a checker. Names must be unique within the registry.
    pub fn register(&mut self, checker: Arc<dyn Checker>) -> Result<()> {
        if self.find(checker.name()).is_some() {
            bail!("Checker '{}' is already registered", checker.name());
        }
        self.checkers.push(checker);
        Ok(())
    }

    /// Get all registered checkers, in registration order.
    pub fn checkers(&self) -> &[Arc<dyn Checker>] {
        &self.checkers
    }

    /// Find a checker by name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Checker>> {
        self.checkers.iter().find(|c| c.name() == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.checkers.iter().map(|c| c.name().to_string()).collect()
    }

    /// Shut every checker down, in registration order.
    pub async fn shutdown_all(&self) {
        for checker in &self.checkers {
            checker.shutdown().await;
        }
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Return the count of registered checkers.
    pub fn len(&self) -> usize {
        self.checkers.len()
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_path(dir: &Path, checker: &str) -> std::path::PathBuf {
    dir.join(format!("{}_cache.json", checker))
}
