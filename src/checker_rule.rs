//! Regex rule checker.
//!
//! Evaluates an ordered list of `(name, pattern, hint)` rules against each
//! sentence and reports every rule that matches, not just the first. A
//! whitelist of exempt terms takes absolute precedence: a sentence that
//! contains any whitelisted term is never flagged.
//!
//! Patterns use `fancy-regex` syntax so rules can use look-around.
//!
//! # Rules file
//!
//! ```toml
//! [[rule]]
//! name = "'것 같다' 띄어쓰기"
//! pattern = "것같"
//! hint = "'것 같다'로 띄어쓰기"
//! ```
//!
//! A missing, unreadable or empty rules file falls back to
//! [`default_rules`]. The whitelist file holds one term per line; blank
//! lines and `#` comments are skipped.

use async_trait::async_trait;
use fancy_regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::RuleConfig;
use crate::models::{CheckVerdict, Hit, RULE};
use crate::traits::Checker;

/// An uncompiled rule, as written in a rules file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub hint: String,
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rule: Vec<RuleSpec>,
}

/// Built-in rules used when no rules file is available.
pub fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec {
            name: "되/돼".to_string(),
            pattern: r"(되(?=\s*요|[^가-힣]|$))|(?<![되돼])돼(?!지)|됬".to_string(),
            hint: "문맥에 맞는 되/돼 확인".to_string(),
        },
        RuleSpec {
            name: "안/않".to_string(),
            pattern: r"\b않(아|고|다|는)\b|\b안(되|돼)".to_string(),
            hint: "부정(안) vs 부정용언(않) 점검".to_string(),
        },
        RuleSpec {
            name: "'것 같다' 띄어쓰기".to_string(),
            pattern: r"것같".to_string(),
            hint: "'것 같다'로 띄어쓰기".to_string(),
        },
        RuleSpec {
            name: "수+단위 띄어쓰기".to_string(),
            pattern: r"(\d+)([가-힣]+)".to_string(),
            hint: "숫자와 단위 사이 띄어쓰기 확인".to_string(),
        },
    ]
}

struct Rule {
    name: String,
    hint: String,
    regex: Result<Regex, String>,
}

impl Rule {
    fn compile(spec: RuleSpec) -> Self {
        let regex = Regex::new(&spec.pattern).map_err(|e| e.to_string());
        if let Err(e) = &regex {
            tracing::warn!(rule = %spec.name, "invalid rule pattern, rule disabled: {}", e);
        }
        Self {
            name: spec.name,
            hint: spec.hint,
            regex,
        }
    }
}

pub struct RuleChecker {
    rules: Vec<Rule>,
    whitelist: BTreeSet<String>,
}

impl RuleChecker {
    pub fn new(rules: Vec<RuleSpec>, whitelist: impl IntoIterator<Item = String>) -> Self {
        Self {
            rules: rules.into_iter().map(Rule::compile).collect(),
            whitelist: whitelist.into_iter().collect(),
        }
    }

    pub fn from_config(config: &RuleConfig) -> Self {
        let rules = config
            .rules_path
            .as_deref()
            .and_then(load_rules)
            .unwrap_or_else(default_rules);
        let whitelist = config
            .whitelist_path
            .as_deref()
            .map(load_whitelist)
            .unwrap_or_default();

        tracing::debug!(
            rules = rules.len(),
            whitelist = whitelist.len(),
            "rule checker ready"
        );
        Self::new(rules, whitelist)
    }

    /// Append a rule after the existing ones.
    pub fn add_rule(&mut self, spec: RuleSpec) {
        self.rules.push(Rule::compile(spec));
    }

    pub fn add_whitelist_term(&mut self, term: impl Into<String>) {
        self.whitelist.insert(term.into());
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn whitelist(&self) -> &BTreeSet<String> {
        &self.whitelist
    }

    fn is_whitelisted(&self, sentence: &str) -> bool {
        self.whitelist
            .iter()
            .any(|term| sentence.contains(term.as_str()))
    }
}

#[async_trait]
impl Checker for RuleChecker {
    fn name(&self) -> &str {
        RULE
    }

    fn description(&self) -> &str {
        "Regex style rules with a whitelist of exempt terms"
    }

    async fn check(&self, sentence: &str) -> CheckVerdict {
        if self.is_whitelisted(sentence) {
            return CheckVerdict::clean();
        }

        let mut hits = Vec::new();
        let mut errors = Vec::new();

        for rule in &self.rules {
            let regex = match &rule.regex {
                Ok(regex) => regex,
                Err(e) => {
                    errors.push(format!("{}: {}", rule.name, e));
                    continue;
                }
            };
            match regex.is_match(sentence) {
                Ok(true) => hits.push(Hit {
                    label: rule.name.clone(),
                    hint: rule.hint.clone(),
                }),
                Ok(false) => {}
                Err(e) => errors.push(format!("{}: {}", rule.name, e)),
            }
        }

        let mut metadata = Map::new();
        if !hits.is_empty() {
            metadata.insert(
                "hits".to_string(),
                serde_json::to_value(&hits).unwrap_or(Value::Null),
            );
        }
        if !errors.is_empty() {
            metadata.insert("rule_errors".to_string(), Value::from(errors));
        }

        CheckVerdict {
            flagged: !hits.is_empty(),
            suggestion: None,
            suggestions: (!hits.is_empty()).then_some(hits),
            metadata,
        }
    }
}

/// Load rules from a TOML rules file. `None` means "use the defaults".
pub fn load_rules(path: &Path) -> Option<Vec<RuleSpec>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), "could not read rules file: {}", e);
            }
            return None;
        }
    };

    match toml::from_str::<RulesFile>(&content) {
        Ok(file) if !file.rule.is_empty() => Some(file.rule),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), "could not parse rules file: {}", e);
            None
        }
    }
}

/// Load whitelist terms, one per line. A missing file gives no terms.
pub fn load_whitelist(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_whitelist(&content),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), "could not read whitelist: {}", e);
            }
            Vec::new()
        }
    }
}

fn parse_whitelist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
