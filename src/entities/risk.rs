// ⚠️ Risk - probability × impact scoring attached to an aspect

use super::enums::RiskCategory;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Valid range for both probability and impact.
pub const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Severity score used for ranking: probability × impact (1..=25).
pub fn risk_level(probability: u8, impact: u8) -> u32 {
    u32::from(probability) * u32::from(impact)
}

/// Payload for registering a risk against an aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRisk {
    pub description: String,
    pub category: RiskCategory,
    pub probability: u8,
    pub impact: u8,
}

impl NewRisk {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("risk description must not be empty"));
        }
        if !SCORE_RANGE.contains(&self.probability) {
            return Err(Error::validation(format!(
                "probability must be between 1 and 5, got {}",
                self.probability
            )));
        }
        if !SCORE_RANGE.contains(&self.impact) {
            return Err(Error::validation(format!(
                "impact must be between 1 and 5, got {}",
                self.impact
            )));
        }
        Ok(())
    }
}

/// Risk as nested inside an aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub id: i64,
    pub description: String,
    pub category: RiskCategory,
    pub probability: u8,
    pub impact: u8,
    pub aspect_id: Option<i64>,
    pub risk_level: u32,
}

/// Full risk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: i64,
    pub description: String,
    pub category: RiskCategory,
    pub probability: u8,
    pub impact: u8,
    pub aspect_id: Option<i64>,
    pub risk_level: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Risk {
    pub fn summary(&self) -> RiskSummary {
        RiskSummary {
            id: self.id,
            description: self.description.clone(),
            category: self.category,
            probability: self.probability,
            impact: self.impact,
            aspect_id: self.aspect_id,
            risk_level: self.risk_level,
        }
    }
}
