//! Runs the full checker set against one sentence.
//!
//! Each checker runs in its own tokio task so checkers evaluate the same
//! sentence in parallel. Results are collected in registry order. A
//! checker task that panics, despite the never-fail contract, is logged
//! and counted as a non-flag verdict; the other checkers' results stand.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{CheckVerdict, SuggestionPayload};
use crate::traits::CheckerRegistry;

/// Per-checker results for one sentence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    /// Checkers that flagged, in registry order.
    pub flagged: Vec<String>,
    /// Payloads of the flagging checkers.
    pub suggestions: BTreeMap<String, SuggestionPayload>,
    /// Non-empty metadata of every checker, flagging or not.
    pub metadata: BTreeMap<String, Map<String, Value>>,
    /// Checkers whose verdict recorded an error.
    pub errors: Vec<String>,
    /// Checker calls made for this sentence.
    pub invocations: usize,
}

impl DispatchOutcome {
    pub fn is_flagged(&self) -> bool {
        !self.flagged.is_empty()
    }

    pub fn from_verdicts(verdicts: impl IntoIterator<Item = (String, CheckVerdict)>) -> Self {
        let mut outcome = Self::default();
        for (name, verdict) in verdicts {
            outcome.record(&name, verdict);
        }
        outcome
    }

    fn record(&mut self, name: &str, verdict: CheckVerdict) {
        self.invocations += 1;
        if verdict.error().is_some() {
            self.errors.push(name.to_string());
        }
        if verdict.flagged {
            self.flagged.push(name.to_string());
            if let Some(payload) = verdict.payload() {
                self.suggestions.insert(name.to_string(), payload);
            }
        }
        if !verdict.metadata.is_empty() {
            self.metadata.insert(name.to_string(), verdict.metadata);
        }
    }
}

pub struct Dispatcher {
    registry: Arc<CheckerRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CheckerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CheckerRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, sentence: &str) -> DispatchOutcome {
        DispatchOutcome::from_verdicts(self.verdicts(sentence).await)
    }

    /// Every checker's raw verdict for `sentence`, in registry order.
    pub async fn verdicts(&self, sentence: &str) -> Vec<(String, CheckVerdict)> {
        let sentence: Arc<str> = Arc::from(sentence);

        let handles: Vec<_> = self
            .registry
            .checkers()
            .iter()
            .map(|checker| {
                let checker = checker.clone();
                let sentence = sentence.clone();
                tokio::spawn(async move { checker.check(&sentence).await })
            })
            .collect();

        let mut verdicts = Vec::with_capacity(handles.len());
        for (checker, handle) in self.registry.checkers().iter().zip(handles) {
            let verdict = match handle.await {
                Ok(verdict) => verdict,
                Err(e) => {
                    tracing::warn!(checker = checker.name(), "checker task failed: {}", e);
                    CheckVerdict::failed(format!("checker task failed: {}", e))
                }
            };
            verdicts.push((checker.name().to_string(), verdict));
        }
        verdicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Hit;
    use crate::traits::Checker;
    use async_trait::async_trait;

    struct Fixed {
        name: &'static str,
        verdict: CheckVerdict,
    }

    #[async_trait]
    impl Checker for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "fixed"
        }
        async fn check(&self, _sentence: &str) -> CheckVerdict {
            self.verdict.clone()
        }
    }

    struct Panics;

    #[async_trait]
    impl Checker for Panics {
        fn name(&self) -> &str {
            "panics"
        }
        fn description(&self) -> &str {
            "always panics"
        }
        async fn check(&self, _sentence: &str) -> CheckVerdict {
            panic!("checker bug");
        }
    }

    fn registry(checkers: Vec<Arc<dyn Checker>>) -> Arc<CheckerRegistry> {
        let mut registry = CheckerRegistry::new();
        for c in checkers {
            registry.register(c).unwrap();
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn records_flagged_checkers_in_registry_order() {
        let hit = Hit {
            label: "r".to_string(),
            hint: "h".to_string(),
        };
        let dispatcher = Dispatcher::new(registry(vec![
            Arc::new(Fixed {
                name: "b",
                verdict: CheckVerdict {
                    flagged: true,
                    suggestions: Some(vec![hit.clone()]),
                    ..Default::default()
                },
            }),
            Arc::new(Fixed {
                name: "quiet",
                verdict: CheckVerdict {
                    flagged: false,
                    suggestion: Some("ignored".to_string()),
                    ..Default::default()
                },
            }),
            Arc::new(Fixed {
                name: "a",
                verdict: CheckVerdict {
                    flagged: true,
                    suggestion: Some("고침".to_string()),
                    ..Default::default()
                },
            }),
        ]));

        let outcome = dispatcher.dispatch("문장").await;
        assert_eq!(outcome.flagged, vec!["b", "a"]);
        assert_eq!(
            outcome.suggestions.get("a"),
            Some(&SuggestionPayload::Text("고침".to_string()))
        );
        assert_eq!(
            outcome.suggestions.get("b"),
            Some(&SuggestionPayload::Hits(vec![hit]))
        );
        assert!(!outcome.suggestions.contains_key("quiet"));
        assert_eq!(outcome.invocations, 3);
    }

    #[tokio::test]
    async fn panicking_checker_does_not_sink_the_sentence() {
        let dispatcher = Dispatcher::new(registry(vec![
            Arc::new(Panics),
            Arc::new(Fixed {
                name: "ok",
                verdict: CheckVerdict {
                    flagged: true,
                    ..Default::default()
                },
            }),
        ]));

        let outcome = dispatcher.dispatch("문장").await;
        assert_eq!(outcome.flagged, vec!["ok"]);
        assert_eq!(outcome.errors, vec!["panics"]);
        assert!(outcome.metadata["panics"].contains_key("error"));
    }

    #[tokio::test]
    async fn soft_failures_are_counted_as_errors() {
        let dispatcher = Dispatcher::new(registry(vec![Arc::new(Fixed {
            name: "down",
            verdict: CheckVerdict::failed("connection refused"),
        })]));
        let outcome = dispatcher.dispatch("문장").await;
        assert!(!outcome.is_flagged());
        assert_eq!(outcome.errors, vec!["down"]);
    }
}
