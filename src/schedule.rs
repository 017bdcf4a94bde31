//! Fans sentences out across a bounded pool of tokio tasks.
//!
//! At most `workers` sentences are in flight at once. Results are
//! collected as they complete, so one slow sentence never holds back the
//! others. Each outcome carries its sentence's input index and
//! [`Scheduler::run`] hands them back in input order.
//! A sentence task that fails is logged and dropped without affecting the
//! rest of the run.

use std::sync::Arc;
use tokio::task::JoinSet;

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::models::Sentence;

/// A sentence together with its checker results.
#[derive(Debug, Clone)]
pub struct SentenceOutcome {
    /// Position of the sentence in the scheduled input.
    pub index: usize,
    pub sentence: Sentence,
    pub outcome: DispatchOutcome,
}

pub struct Scheduler {
    dispatcher: Arc<Dispatcher>,
    workers: usize,
}

impl Scheduler {
    /// `workers` is clamped to at least one.
    pub fn new(dispatcher: Arc<Dispatcher>, workers: usize) -> Self {
        Self {
            dispatcher,
            workers: workers.max(1),
        }
    }

    /// Check every sentence; the result is in input order.
    pub async fn run(&self, sentences: Vec<Sentence>) -> Vec<SentenceOutcome> {
        let total = sentences.len();
        let mut results = Vec::with_capacity(total);
        let mut in_flight = JoinSet::new();

        for (index, sentence) in sentences.into_iter().enumerate() {
            while in_flight.len() >= self.workers {
                collect_next(&mut in_flight, &mut results).await;
            }
            let dispatcher = self.dispatcher.clone();
            in_flight.spawn(async move {
                let outcome = dispatcher.dispatch(&sentence.text).await;
                SentenceOutcome {
                    index,
                    sentence,
                    outcome,
                }
            });
        }

        while !in_flight.is_empty() {
            collect_next(&mut in_flight, &mut results).await;
        }

        results.sort_unstable_by_key(|done| done.index);

        if results.len() < total {
            tracing::warn!(
                skipped = total - results.len(),
                "some sentences were skipped after task failures"
            );
        }
        results
    }
}

async fn collect_next(
    in_flight: &mut JoinSet<SentenceOutcome>,
    results: &mut Vec<SentenceOutcome>,
) {
    match in_flight.join_next().await {
        Some(Ok(done)) => results.push(done),
        Some(Err(e)) => tracing::warn!("sentence task failed, skipping: {}", e),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckVerdict;
    use crate::traits::{Checker, CheckerRegistry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks the peak number of concurrent `check` calls.
    #[derive(Default)]
    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Checker for Gauge {
        fn name(&self) -> &str {
            "gauge"
        }
        fn description(&self) -> &str {
            "gauge"
        }
        async fn check(&self, sentence: &str) -> CheckVerdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            // Longer sentences finish first, scrambling completion order.
            let delay = 50u64.saturating_sub(sentence.len() as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            CheckVerdict {
                flagged: sentence.contains('x'),
                ..Default::default()
            }
        }
    }

    fn scheduler(gauge: Arc<Gauge>, workers: usize) -> Scheduler {
        let mut registry = CheckerRegistry::new();
        registry.register(gauge).unwrap();
        Scheduler::new(Arc::new(Dispatcher::new(Arc::new(registry))), workers)
    }

    #[tokio::test(start_paused = true)]
    async fn every_sentence_is_processed_once() {
        let gauge = Arc::new(Gauge::default());
        let sentences: Vec<Sentence> = (0..20)
            .map(|i| Sentence::new(1, "x".repeat(i + 1)))
            .collect();

        let results = scheduler(gauge.clone(), 4).run(sentences).await;
        assert_eq!(results.len(), 20);
        assert_eq!(gauge.calls.load(Ordering::SeqCst), 20);

        let lengths: Vec<usize> = results.iter().map(|r| r.sentence.text.len()).collect();
        assert_eq!(lengths, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_keep_input_order_when_completion_is_reversed() {
        let gauge = Arc::new(Gauge::default());
        // Shortest sentence sleeps longest, so tasks finish last-to-first.
        let sentences: Vec<Sentence> = (0..8)
            .map(|i| Sentence::new(1, "x".repeat(i + 1)))
            .collect();

        let results = scheduler(gauge, 8).run(sentences).await;
        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        assert_eq!(results[0].sentence.text, "x");
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_work_is_bounded_by_workers() {
        let gauge = Arc::new(Gauge::default());
        let sentences: Vec<Sentence> = (0..12).map(|i| Sentence::new(1, "a".repeat(i))).collect();
        scheduler(gauge.clone(), 3).run(sentences).await;
        assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
        assert!(gauge.peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn empty_input_invokes_nothing() {
        let gauge = Arc::new(Gauge::default());
        let results = scheduler(gauge.clone(), 4).run(Vec::new()).await;
        assert!(results.is_empty());
        assert_eq!(gauge.calls.load(Ordering::SeqCst), 0);
    }
}
