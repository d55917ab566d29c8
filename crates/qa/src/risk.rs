//! Keyword risk scoring.
//!
//! A score starts at a neutral baseline and moves by the weight of every rule
//! whose phrase appears anywhere in the document. Matching is a plain
//! case-insensitive substring test: "we do not offer data encryption" still
//! fires the "data encryption" rule.

use policylens_core::config::{RiskRuleSetting, RiskSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NEUTRAL_BASELINE: i32 = 50;
pub const MAX_SCORE: u8 = 100;

/// One keyword rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyScoreRule {
    pub phrase: String,
    pub weight: i32,
}

impl PrivacyScoreRule {
    pub fn new(phrase: impl Into<String>, weight: i32) -> Self {
        Self {
            phrase: phrase.into(),
            weight,
        }
    }
}

impl From<&RiskRuleSetting> for PrivacyScoreRule {
    fn from(setting: &RiskRuleSetting) -> Self {
        Self::new(setting.phrase.clone(), setting.weight)
    }
}

const DEFAULT_RULES: &[(&str, i32)] = &[
    ("data encryption", 10),
    ("GDPR compliance", 10),
    ("allows data deletion", 10),
    ("no third-party sharing", 15),
    ("clear opt-out option", 10),
    ("sells data to third parties", -15),
    ("collects location", -10),
    ("tracks browsing", -10),
    ("stores data indefinitely", -15),
    ("no mention of user data protection", -10),
    ("no opt-out for data collection", -10),
    ("uses data for AI training", -15),
    ("no transparency on data storage", -5),
];

/// Baseline plus an ordered list of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub baseline: i32,
    pub rules: Vec<PrivacyScoreRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            baseline: NEUTRAL_BASELINE,
            rules: DEFAULT_RULES
                .iter()
                .map(|(phrase, weight)| PrivacyScoreRule::new(*phrase, *weight))
                .collect(),
        }
    }
}

impl RuleSet {
    pub fn new(baseline: i32, rules: Vec<PrivacyScoreRule>) -> Self {
        Self { baseline, rules }
    }

    /// Rules from configuration, falling back to the built-in table.
    pub fn from_settings(settings: &RiskSettings) -> Self {
        let rules = match settings.rules {
            Some(ref configured) => configured.iter().map(PrivacyScoreRule::from).collect(),
            None => Self::default().rules,
        };

        Self {
            baseline: settings.baseline,
            rules,
        }
    }

    /// Rules whose phrase occurs in `text`, in rule order.
    pub fn fired<'a>(&'a self, text: &str) -> Vec<&'a PrivacyScoreRule> {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| {
                let needle = rule.phrase.to_lowercase();
                !needle.is_empty() && haystack.contains(&needle)
            })
            .collect()
    }
}

/// Privacy risk score, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    fn clamped(raw: i64) -> Self {
        Self(raw.clamp(0, i64::from(MAX_SCORE)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, MAX_SCORE)
    }
}

/// Score with the rules that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub score: RiskScore,
    pub baseline: i32,
    pub fired: Vec<PrivacyScoreRule>,
}

/// Score `text` against `rules`. Each rule counts once however often its
/// phrase repeats.
pub fn score(text: &str, rules: &RuleSet) -> RiskScore {
    report(text, rules).score
}

pub fn report(text: &str, rules: &RuleSet) -> RiskReport {
    let fired: Vec<PrivacyScoreRule> = rules.fired(text).into_iter().cloned().collect();
    let raw = fired
        .iter()
        .fold(i64::from(rules.baseline), |acc, rule| acc + i64::from(rule.weight));

    tracing::debug!(
        "Risk rules fired: {} of {} (raw score {})",
        fired.len(),
        rules.rules.len(),
        raw
    );

    RiskReport {
        score: RiskScore::clamped(raw),
        baseline: rules.baseline,
        fired,
    }
}
