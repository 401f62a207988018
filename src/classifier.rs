// 🏷️ Aspect Classifier - Rules as Data
// Zero-shot style suggestion of an AspectType from free text. Every candidate label is
// scored from keyword hits, then the scores are normalised with softmax so the
// confidence behaves like a probability over the candidate set.

use crate::entities::AspectType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Softmax sharpness: how much one extra keyword hit shifts the distribution.
const SHARPNESS: f64 = 1.5;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Label this rule votes for
    pub category: AspectType,

    /// Lowercase keywords or phrases; a trailing `*` matches any word continuation
    pub keywords: Vec<String>,

    /// Score added per matched keyword
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl KeywordRule {
    fn new(category: AspectType, keywords: &[&str]) -> Self {
        KeywordRule {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            weight: default_weight(),
        }
    }

    /// Number of keywords found in already-normalised, space-padded text.
    fn hits(&self, padded: &str) -> usize {
        self.keywords
            .iter()
            .filter(|keyword| {
                let keyword = keyword.trim().to_lowercase();
                match keyword.strip_suffix('*') {
                    Some(prefix) => padded.contains(&format!(" {}", prefix)),
                    None => padded.contains(&format!(" {} ", keyword)),
                }
            })
            .count()
    }
}

/// Lowercase, replace anything that is not alphanumeric with a space, collapse runs and
/// pad both ends so whole-word matches are plain substring checks.
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| ((s - max) * SHARPNESS).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub suggested_category: AspectType,
    pub confidence_score: f64,
}

/// Anything that can suggest an aspect type for a description.
pub trait AspectClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Classification>;
}

// ============================================================================
// KEYWORD CLASSIFIER
// ============================================================================

pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
}

impl KeywordClassifier {
    /// Load rules from a JSON file (an array of `KeywordRule`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let rules: Vec<KeywordRule> = serde_json::from_str(&content)?;
        tracing::info!(path = ?path.as_ref(), rules = rules.len(), "Loaded classifier rules");
        KeywordClassifier::from_rules(rules)
    }

    pub fn from_rules(rules: Vec<KeywordRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::validation("classifier needs at least one rule"));
        }
        Ok(KeywordClassifier { rules })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        KeywordClassifier {
            rules: vec![
                KeywordRule::new(
                    AspectType::Emission,
                    &[
                        "emission*", "exhaust", "smoke", "combustion", "co2", "methane", "gas",
                        "gases", "fumes", "vapor", "vapour", "discharge*", "release*", "noise",
                        "odor", "odour", "dust", "spill*",
                    ],
                ),
                KeywordRule::new(
                    AspectType::Consumption,
                    &[
                        "consumption", "consum*", "electricity", "energy", "fuel", "power", "kwh",
                        "heating", "lighting",
                    ],
                ),
                KeywordRule::new(
                    AspectType::WasteGeneration,
                    &[
                        "waste*", "scrap", "residue*", "sludge", "packaging", "garbage", "debris",
                        "hazardous", "landfill", "disposal", "recycl*", "byproduct*",
                    ],
                ),
                KeywordRule::new(
                    AspectType::ResourceUse,
                    &[
                        "water", "land", "timber", "wood", "mineral*", "extraction", "soil",
                        "groundwater", "raw material*", "forest*", "habitat*",
                    ],
                ),
            ],
        }
    }
}

impl AspectClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<Classification> {
        if text.trim().is_empty() {
            return Err(Error::validation("text to classify must not be empty"));
        }
        let padded = normalize(text);

        // One score per candidate label, in declaration order
        let mut labels: Vec<AspectType> = Vec::new();
        let mut scores: Vec<f64> = Vec::new();
        for rule in &self.rules {
            let score = rule.hits(&padded) as f64 * rule.weight;
            match labels.iter().position(|l| *l == rule.category) {
                Some(i) => scores[i] += score,
                None => {
                    labels.push(rule.category);
                    scores.push(score);
                }
            }
        }

        let probabilities = softmax(&scores);
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }

        Ok(Classification {
            suggested_category: labels[best],
            confidence_score: probabilities[best],
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
