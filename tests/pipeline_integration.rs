//! Integration tests for the review pipeline with custom checkers.
//!
//! These tests drive `Pipeline` end-to-end with in-memory `Checker` and
//! `SpellService` implementations, covering merge semantics, ordering,
//! failure isolation and cache persistence across runs.

use anyhow::{bail, Result};
use async_trait::async_trait;
use kproof::cache::ResultCache;
use kproof::checker_hanspell::{HanspellChecker, SpellService};
use kproof::checker_rule::{default_rules, RuleChecker};
use kproof::models::{CheckVerdict, Sentence, SuggestionPayload, HANSPELL, RULE};
use kproof::pipeline::{Pipeline, ReviewError, ReviewOptions};
use kproof::rate_limit::RateLimiter;
use kproof::traits::{Checker, CheckerRegistry};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ─── Test Checkers ──────────────────────────────────────────────────

/// Flags sentences containing a marker and proposes a fixed correction.
struct MarkerChecker {
    name: &'static str,
    marker: &'static str,
    suggestion: Option<&'static str>,
}

#[async_trait]
impl Checker for MarkerChecker {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Flags sentences containing a marker"
    }

    async fn check(&self, sentence: &str) -> CheckVerdict {
        if sentence.contains(self.marker) {
            CheckVerdict {
                flagged: true,
                suggestion: self.suggestion.map(str::to_string),
                ..Default::default()
            }
        } else {
            CheckVerdict::clean()
        }
    }
}

/// Panics on one specific sentence.
struct FragileChecker;

#[async_trait]
impl Checker for FragileChecker {
    fn name(&self) -> &str {
        "fragile"
    }

    fn description(&self) -> &str {
        "Panics on the word 폭탄"
    }

    async fn check(&self, sentence: &str) -> CheckVerdict {
        if sentence.contains("폭탄") {
            panic!("fragile checker hit its bug");
        }
        CheckVerdict {
            flagged: true,
            ..Default::default()
        }
    }
}

/// Flags every sentence, taking longer on sentences containing `slow`.
struct SlowFlagChecker {
    slow: &'static str,
}

#[async_trait]
impl Checker for SlowFlagChecker {
    fn name(&self) -> &str {
        "slow"
    }

    fn description(&self) -> &str {
        "Flags everything after a per-sentence delay"
    }

    async fn check(&self, sentence: &str) -> CheckVerdict {
        let delay = if sentence.contains(self.slow) { 50 } else { 1 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        CheckVerdict {
            flagged: true,
            ..Default::default()
        }
    }
}

/// Spell service backed by a lookup table, counting calls.
struct TableSpellService {
    table: HashMap<&'static str, &'static str>,
    calls: AtomicUsize,
}

impl TableSpellService {
    fn new(pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            table: pairs.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SpellService for TableSpellService {
    async fn correct(&self, sentence: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if sentence.contains("오류") {
            bail!("service unavailable");
        }
        Ok(self
            .table
            .get(sentence)
            .map(|s| s.to_string())
            .unwrap_or_else(|| sentence.to_string()))
    }
}

fn pipeline(checkers: Vec<Arc<dyn Checker>>, workers: usize) -> (Pipeline, Arc<CheckerRegistry>) {
    let mut registry = CheckerRegistry::new();
    for checker in checkers {
        registry.register(checker).unwrap();
    }
    let registry = Arc::new(registry);
    let pipeline = Pipeline::new(
        registry.clone(),
        ReviewOptions {
            workers,
            snippet_length: 60,
        },
    )
    .unwrap();
    (pipeline, registry)
}

fn sentences(texts: &[(u32, &str)]) -> Vec<Sentence> {
    texts
        .iter()
        .map(|(page, text)| Sentence::new(*page, *text))
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn a_sentence_flagged_by_any_checker_becomes_one_row() {
    let (pipeline, _) = pipeline(
        vec![
            Arc::new(MarkerChecker {
                name: "a",
                marker: "가",
                suggestion: None,
            }),
            Arc::new(MarkerChecker {
                name: "b",
                marker: "나",
                suggestion: None,
            }),
        ],
        2,
    );

    let rows = pipeline
        .review(sentences(&[(1, "가 문장"), (1, "나 문장"), (1, "가나 문장"), (1, "다 문장")]))
        .await;

    assert_eq!(rows.len(), 3);
    let both = rows.iter().find(|r| r.sentence == "가나 문장").unwrap();
    assert_eq!(both.sources, vec!["a", "b"]);
    assert!(rows.iter().all(|r| r.sentence != "다 문장"));
}

#[tokio::test]
async fn rule_only_scenario_has_no_representative_suggestion() {
    let (pipeline, _) = pipeline(
        vec![Arc::new(RuleChecker::new(default_rules(), Vec::new()))],
        4,
    );

    let rows = pipeline.review(sentences(&[(1, "안됬어요")])).await;

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.sources, vec![RULE]);
    assert_eq!(row.representative_suggestion, None);
    assert_eq!(row.diff, "");
    assert!(row.error_types.contains(&"되/돼".to_string()));
    assert!(matches!(
        row.suggestion_by_source.get(RULE),
        Some(SuggestionPayload::Hits(_))
    ));
}

#[tokio::test]
async fn rule_and_spell_rows_rank_first() {
    let service = Arc::new(TableSpellService::new(&[
        ("오늘은 날씨가 좋다.", "오늘은 날씨가 좋다"),
        ("비가 올것같다", "비가 올 것 같다"),
    ]));
    let (pipeline, _) = pipeline(
        vec![
            Arc::new(HanspellChecker::new(
                service,
                ResultCache::in_memory(),
                RateLimiter::with_interval(Duration::ZERO),
            )),
            Arc::new(RuleChecker::new(default_rules(), Vec::new())),
        ],
        4,
    );

    let rows = pipeline
        .review(sentences(&[(1, "오늘은 날씨가 좋다."), (5, "비가 올것같다")]))
        .await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].sentence, "비가 올것같다");
    assert_eq!(rows[0].sources, vec![HANSPELL, RULE]);
    assert_eq!(
        rows[0].representative_suggestion.as_deref(),
        Some("비가 올 것 같다")
    );
    assert_eq!(rows[0].diff, "비가 올[+ +]것[+ +]같다");
    assert_eq!(rows[1].sources, vec![HANSPELL]);
}

#[tokio::test]
async fn empty_input_produces_no_rows_and_no_calls() {
    let service = Arc::new(TableSpellService::new(&[]));
    let (pipeline, _) = pipeline(
        vec![Arc::new(HanspellChecker::new(
            service.clone(),
            ResultCache::in_memory(),
            RateLimiter::per_second(5),
        ))],
        4,
    );

    let outcome = pipeline.review_detailed(Vec::new()).await;
    assert!(outcome.rows.is_empty());
    assert_eq!(outcome.reviewed, 0);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_panicking_checker_does_not_lose_other_verdicts() {
    let (pipeline, _) = pipeline(
        vec![
            Arc::new(FragileChecker),
            Arc::new(MarkerChecker {
                name: "marker",
                marker: "폭탄",
                suggestion: Some("고친 문장"),
            }),
        ],
        2,
    );

    let outcome = pipeline
        .review_detailed(sentences(&[(1, "폭탄 문장"), (2, "평범한 문장")]))
        .await;

    assert_eq!(outcome.reviewed, 2);
    assert_eq!(outcome.rows.len(), 2);
    let bomb = outcome
        .rows
        .iter()
        .find(|r| r.sentence == "폭탄 문장")
        .unwrap();
    assert_eq!(bomb.sources, vec!["marker"]);
    assert_eq!(outcome.errors_by_checker.get("fragile"), Some(&1));
}

#[tokio::test]
async fn service_failures_are_soft_and_counted() {
    let service = Arc::new(TableSpellService::new(&[]));
    let (pipeline, _) = pipeline(
        vec![Arc::new(HanspellChecker::new(
            service,
            ResultCache::in_memory(),
            RateLimiter::with_interval(Duration::ZERO),
        ))],
        1,
    );

    let outcome = pipeline
        .review_detailed(sentences(&[(1, "오류가 나는 문장"), (1, "멀쩡한 문장")]))
        .await;

    assert!(outcome.rows.is_empty());
    assert_eq!(outcome.errors_by_checker.get(HANSPELL), Some(&1));
}

#[test]
fn pipeline_requires_a_checker() {
    let result = Pipeline::new(Arc::new(CheckerRegistry::new()), ReviewOptions::default());
    assert!(matches!(result, Err(ReviewError::NoCheckers)));
}

#[tokio::test]
async fn cached_verdicts_survive_a_restart_without_service_calls() {
    let tmp = TempDir::new().unwrap();
    let cache_path = tmp.path().join("hanspell_cache.json");
    let input = sentences(&[(1, "비가 올것같다"), (2, "오늘은 날씨가 좋다.")]);
    let table = [("비가 올것같다", "비가 올 것 같다")];

    let first_service = Arc::new(TableSpellService::new(&table));
    let (first, registry) = pipeline(
        vec![Arc::new(HanspellChecker::new(
            first_service.clone(),
            ResultCache::load(&cache_path),
            RateLimiter::with_interval(Duration::ZERO),
        ))],
        2,
    );
    let first_rows = first.review(input.clone()).await;
    registry.shutdown_all().await;
    assert_eq!(first_service.calls.load(Ordering::SeqCst), 2);
    assert!(cache_path.exists());

    let second_service = Arc::new(TableSpellService::new(&table));
    let (second, _) = pipeline(
        vec![Arc::new(HanspellChecker::new(
            second_service.clone(),
            ResultCache::load(&cache_path),
            RateLimiter::with_interval(Duration::ZERO),
        ))],
        2,
    );
    let second_rows = second.review(input).await;

    assert_eq!(second_service.calls.load(Ordering::SeqCst), 0);
    assert_eq!(first_rows, second_rows);
}

#[tokio::test]
async fn rows_come_back_in_report_order_regardless_of_workers() {
    let make = || -> Vec<Arc<dyn Checker>> {
        vec![
            Arc::new(MarkerChecker {
                name: "spell",
                marker: "맞춤",
                suggestion: Some("교정"),
            }),
            Arc::new(RuleChecker::new(default_rules(), Vec::new())),
        ]
    };
    let input = sentences(&[
        (3, "맞춤법 문장"),
        (1, "맞춤 3개"),
        (2, "올것같다 맞춤"),
        (1, "그냥 맞춤"),
        (4, "것같은 느낌"),
    ]);

    let (serial, _) = pipeline(make(), 1);
    let (parallel, _) = pipeline(make(), 8);
    let a = serial.review(input.clone()).await;
    let b = parallel.review(input).await;

    let order = |rows: &[kproof::models::FlaggedRow]| -> Vec<String> {
        rows.iter().map(|r| r.sentence.clone()).collect()
    };
    assert_eq!(order(&a), order(&b));
    assert_eq!(
        order(&a),
        vec!["맞춤 3개", "올것같다 맞춤", "것같은 느낌", "그냥 맞춤", "맞춤법 문장"]
    );
}

#[tokio::test(start_paused = true)]
async fn equal_rank_rows_keep_input_order_whichever_finishes_first() {
    let input = sentences(&[(1, "첫째 문장입니다"), (1, "둘째 문장입니다")]);
    let mut orders = Vec::new();
    for slow in ["첫째", "둘째"] {
        let (pipeline, _) = pipeline(vec![Arc::new(SlowFlagChecker { slow })], 4);
        let rows = pipeline.review(input.clone()).await;
        orders.push(
            rows.iter()
                .map(|r| r.sentence.clone())
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(orders[0], orders[1]);
    assert_eq!(orders[0], vec!["첫째 문장입니다", "둘째 문장입니다"]);
}

#[tokio::test]
async fn ocr_sentences_produce_ocr_rows() {
    let (pipeline, _) = pipeline(
        vec![Arc::new(RuleChecker::new(default_rules(), Vec::new()))],
        2,
    );
    let scanned = Sentence {
        page: 2,
        text: "비가 올것같다".to_string(),
        is_ocr: true,
    };

    let rows = pipeline
        .review(vec![Sentence::new(1, "일정이 미뤄질것같다"), scanned])
        .await;

    let flags: Vec<(u32, bool)> = rows.iter().map(|r| (r.page, r.is_ocr)).collect();
    assert_eq!(flags, vec![(1, false), (2, true)]);
}
