// 🌱 Environmental Aspect - an element of an activity that interacts with the environment

use super::compliance::ObligationSummary;
use super::enums::{AspectType, LifecycleStage};
use super::risk::RiskSummary;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload for registering an aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAspect {
    pub name: String,
    pub description: String,
    pub lifecycle_stage: LifecycleStage,
    pub aspect_type: AspectType,
    #[serde(default)]
    pub is_significant: bool,
}

impl NewAspect {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("aspect name must not be empty"));
        }
        Ok(())
    }
}

/// Aspect without its relations, used when nested inside other records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub lifecycle_stage: LifecycleStage,
    pub aspect_type: AspectType,
    pub is_significant: bool,
}

/// Aspect with its linked obligations and risks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalAspect {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub lifecycle_stage: LifecycleStage,
    pub aspect_type: AspectType,
    pub is_significant: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub obligations: Vec<ObligationSummary>,
    #[serde(default)]
    pub risks: Vec<RiskSummary>,
}
