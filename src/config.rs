use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub checkers: CheckersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReviewConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_korean_ratio")]
    pub korean_ratio: f64,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            snippet_length: default_snippet_length(),
            min_length: default_min_length(),
            korean_ratio: default_korean_ratio(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_workers() -> usize {
    4
}
fn default_snippet_length() -> usize {
    60
}
fn default_min_length() -> usize {
    10
}
fn default_korean_ratio() -> f64 {
    0.3
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(".kproof-cache")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CheckersConfig {
    #[serde(default)]
    pub hanspell: HanspellConfig,
    #[serde(default)]
    pub spacing: SpacingConfig,
    #[serde(default)]
    pub rule: RuleConfig,
    #[serde(default)]
    pub languagetool: LanguageToolConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HanspellConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_hanspell_rate")]
    pub rate_limit_per_sec: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HanspellConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            rate_limit_per_sec: default_hanspell_rate(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_hanspell_rate() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpacingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Program and arguments of the spacing model process. It runs for
    /// the whole review, answering one line per input line.
    #[serde(default)]
    pub command: Vec<String>,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rules_path")]
    pub rules_path: Option<PathBuf>,
    #[serde(default = "default_whitelist_path")]
    pub whitelist_path: Option<PathBuf>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules_path: default_rules_path(),
            whitelist_path: default_whitelist_path(),
        }
    }
}

fn default_rules_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/rules.toml"))
}
fn default_whitelist_path() -> Option<PathBuf> {
    Some(PathBuf::from("data/whitelist.txt"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct LanguageToolConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_languagetool_url")]
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub rate_limit_per_sec: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LanguageToolConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_languagetool_url(),
            language: default_language(),
            rate_limit_per_sec: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_languagetool_url() -> String {
    "http://127.0.0.1:8081".to_string()
}
fn default_language() -> String {
    "ko-KR".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            review: ReviewConfig::default(),
            checkers: CheckersConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate review
    if config.review.workers == 0 {
        anyhow::bail!("review.workers must be >= 1");
    }

    if config.review.snippet_length == 0 {
        anyhow::bail!("review.snippet_length must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.review.korean_ratio) {
        anyhow::bail!("review.korean_ratio must be in [0.0, 1.0]");
    }

    // Validate checkers
    if config.checkers.hanspell.rate_limit_per_sec == 0 {
        anyhow::bail!("checkers.hanspell.rate_limit_per_sec must be >= 1");
    }

    if config.checkers.languagetool.rate_limit_per_sec == Some(0) {
        anyhow::bail!("checkers.languagetool.rate_limit_per_sec must be >= 1");
    }

    if config.checkers.languagetool.enabled && config.checkers.languagetool.url.trim().is_empty()
    {
        anyhow::bail!("checkers.languagetool.url must be set when languagetool is enabled");
    }

    Ok(())
}
