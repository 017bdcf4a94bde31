//! # kproof
//!
//! Korean text-quality review for documents.
//!
//! kproof extracts text from PDF, DOCX, PPTX and plain-text documents,
//! splits it into sentences and runs every sentence through a configurable
//! set of checkers (a spelling service, a spacing model, regex style rules
//! and a grammar server). Sentences flagged by any checker become report
//! rows with a representative correction and an inline diff, ordered so the
//! most reliable findings come first.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌───────────┐   ┌──────────────┐
//! │  Extract  │──▶│  Segment   │──▶│ Scheduler │──▶│  Dispatcher  │
//! │ pdf/ooxml │   │ NFKC+split │   │ N workers │   │ all checkers │
//! └───────────┘   └────────────┘   └───────────┘   └──────┬───────┘
//!                                                         │
//!                      ┌──────────┐   ┌────────────┐      │
//!                      │  Export  │◀──│ Sort rows  │◀─ Aggregate + diff
//!                      │   JSON   │   └────────────┘
//!                      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kproof checkers                          # show checker status
//! kproof sentence "비가 올것같다"           # check one sentence
//! kproof check report.pdf --out out.json   # review a document
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`traits`] | `Checker` contract and registry |
//! | [`cache`] | Per-checker persistent result cache |
//! | [`rate_limit`] | Minimum-interval call spacing |
//! | [`checker_hanspell`] | Spelling service checker |
//! | [`checker_spacing`] | Spacing model checker |
//! | [`checker_rule`] | Regex rule checker |
//! | [`checker_languagetool`] | Grammar server checker |
//! | [`dispatch`] | One sentence through all checkers |
//! | [`schedule`] | Bounded sentence worker pool |
//! | [`aggregate`] | Report row construction |
//! | [`diff`] | Inline character diff |
//! | [`report`] | Row ordering and run statistics |
//! | [`pipeline`] | End-to-end review of sentences |
//! | [`extract`] | Page text extraction |
//! | [`text`] | Normalization and segmentation |
//! | [`review`] | Document review command |
//! | [`export`] | JSON report output |
//! | [`inspect`] | Checker listing and single-sentence check |

pub mod aggregate;
pub mod cache;
pub mod checker_hanspell;
pub mod checker_languagetool;
pub mod checker_rule;
pub mod checker_spacing;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod export;
pub mod extract;
pub mod inspect;
pub mod models;
pub mod pipeline;
pub mod rate_limit;
pub mod report;
pub mod review;
pub mod schedule;
pub mod text;
pub mod traits;
