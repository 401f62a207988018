// 📜 Environmental Policy - the single, top-level commitment document

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload for creating or replacing the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPolicy {
    pub version: String,
    pub content: String,
    pub approval_date: DateTime<Utc>,
    pub approved_by: String,
    pub includes_climate_commitment: bool,
    pub includes_circular_economy_commitment: bool,
    pub includes_biodiversity_commitment: bool,
}

impl NewPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::validation("policy version must not be empty"));
        }
        if self.approved_by.trim().is_empty() {
            return Err(Error::validation("policy approver must not be empty"));
        }
        Ok(())
    }
}

/// Stored policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalPolicy {
    pub id: i64,
    pub version: String,
    pub content: String,
    pub approval_date: DateTime<Utc>,
    pub approved_by: String,
    pub includes_climate_commitment: bool,
    pub includes_circular_economy_commitment: bool,
    pub includes_biodiversity_commitment: bool,
}

impl EnvironmentalPolicy {
    pub fn from_new(id: i64, new: NewPolicy) -> Self {
        EnvironmentalPolicy {
            id,
            version: new.version,
            content: new.content,
            approval_date: new.approval_date,
            approved_by: new.approved_by,
            includes_climate_commitment: new.includes_climate_commitment,
            includes_circular_economy_commitment: new.includes_circular_economy_commitment,
            includes_biodiversity_commitment: new.includes_biodiversity_commitment,
        }
    }

    /// Number of the three optional commitments the policy makes.
    pub fn commitment_count(&self) -> usize {
        [
            self.includes_climate_commitment,
            self.includes_circular_economy_commitment,
            self.includes_biodiversity_commitment,
        ]
        .iter()
        .filter(|c| **c)
        .count()
    }
}
