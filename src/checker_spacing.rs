//! Model-backed spacing checker.
//!
//! Runs a local spacing-correction model and flags a sentence only when
//! the model's output differs from the input in a significant way (see
//! [`significant_change`]). Model runs are blocking and comparatively
//! slow, so they go to tokio's blocking pool and their verdicts are
//! cached per sentence.
//!
//! The built-in model is an external process configured as
//! `checkers.spacing.command`. It is started once and kept for the run:
//! each sentence is written to its stdin as one line and the re-spaced
//! sentence is read back as one line from its stdout.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};

use crate::cache::ResultCache;
use crate::config::SpacingConfig;
use crate::models::{CheckVerdict, SPACING};
use crate::traits::{Checker, CheckerStatus};

/// A synchronous spacing-correction model.
pub trait SpacingModel: Send + Sync {
    fn respace(&self, sentence: &str) -> Result<String>;

    /// Release whatever the model holds. Called once at checker shutdown.
    fn shutdown(&self) {}
}

/// [`SpacingModel`] backed by one long-lived child process.
///
/// The process starts on the first sentence. Calls are serialized over its
/// pipes; if a call fails the process is killed and the next call starts a
/// fresh one.
pub struct CommandSpacingModel {
    program: String,
    args: Vec<String>,
    process: Mutex<Option<ModelProcess>>,
}

impl CommandSpacingModel {
    pub fn new(command: &[String]) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("spacing command must not be empty");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            process: Mutex::new(None),
        })
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ModelProcess>> {
        self.process.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SpacingModel for CommandSpacingModel {
    fn respace(&self, sentence: &str) -> Result<String> {
        let mut slot = self.slot();
        let mut process = match slot.take() {
            Some(process) => process,
            None => ModelProcess::spawn(&self.program, &self.args)?,
        };

        let corrected = process.respace(sentence)?;
        *slot = Some(process);
        Ok(corrected)
    }

    fn shutdown(&self) {
        self.slot().take();
    }
}

struct ModelProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ModelProcess {
    fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to run spacing model '{}'", program))?;
        tracing::debug!(program, pid = child.id(), "started spacing model");

        let stdin = child.stdin.take().context("spacing model stdin unavailable")?;
        let stdout = child
            .stdout
            .take()
            .context("spacing model stdout unavailable")?;
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn respace(&mut self, sentence: &str) -> Result<String> {
        let line = sentence.replace(['\r', '\n'], " ");
        writeln!(self.stdin, "{}", line).context("spacing model stopped reading")?;
        self.stdin.flush()?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            bail!("spacing model exited");
        }
        Ok(reply.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Drop for ModelProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Whether a re-spaced sentence differs enough from the original to report.
///
/// Significant means: a different length in chars, a different number of
/// spaces, or a different number of whitespace-separated tokens.
pub fn significant_change(original: &str, corrected: &str) -> bool {
    if original == corrected {
        return false;
    }
    if original.chars().count() != corrected.chars().count() {
        return true;
    }
    if count_spaces(original) != count_spaces(corrected) {
        return true;
    }
    original.split_whitespace().count() != corrected.split_whitespace().count()
}

fn count_spaces(s: &str) -> usize {
    s.chars().filter(|&c| c == ' ').count()
}

pub struct SpacingChecker {
    model: Option<Arc<dyn SpacingModel>>,
    cache: ResultCache,
}

impl SpacingChecker {
    pub fn new(model: Arc<dyn SpacingModel>, cache: ResultCache) -> Self {
        Self {
            model: Some(model),
            cache,
        }
    }

    pub fn from_config(config: &SpacingConfig, cache_path: &Path) -> Self {
        let model: Option<Arc<dyn SpacingModel>> = match CommandSpacingModel::new(&config.command)
        {
            Ok(model) => Some(Arc::new(model)),
            Err(_) => {
                tracing::warn!("spacing enabled without checkers.spacing.command; it will not flag anything");
                None
            }
        };

        Self {
            model,
            cache: ResultCache::load(cache_path),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}

#[async_trait]
impl Checker for SpacingChecker {
    fn name(&self) -> &str {
        SPACING
    }

    fn description(&self) -> &str {
        "Word spacing corrections from a local spacing model"
    }

    fn status(&self) -> CheckerStatus {
        match self.model {
            Some(_) => CheckerStatus::Ready,
            None => CheckerStatus::Unavailable("no model command configured".to_string()),
        }
    }

    async fn check(&self, sentence: &str) -> CheckVerdict {
        let Some(model) = &self.model else {
            return CheckVerdict::failed("spacing model not configured");
        };

        self.cache
            .get_or_compute(sentence, || async move {
                let model = model.clone();
                let input = sentence.to_string();
                let corrected =
                    match tokio::task::spawn_blocking(move || model.respace(&input)).await {
                        Ok(Ok(corrected)) => corrected,
                        Ok(Err(e)) => return CheckVerdict::failed(format!("{:#}", e)),
                        Err(e) => {
                            return CheckVerdict::failed(format!("spacing model crashed: {}", e))
                        }
                    };

                let flagged = significant_change(sentence, &corrected);
                let mut metadata = Map::new();
                metadata.insert("original".to_string(), Value::from(sentence));
                metadata.insert("corrected".to_string(), Value::from(corrected.as_str()));
                metadata.insert(
                    "original_length".to_string(),
                    Value::from(sentence.chars().count()),
                );
                metadata.insert(
                    "corrected_length".to_string(),
                    Value::from(corrected.chars().count()),
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
        if let Some(model) = &self.model {
            model.shutdown();
        }
    }
}
