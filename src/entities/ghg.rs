// 🏭 GHG registries - emission factors, emission sources and activity data

use super::enums::{EmissionSourceType, GhgScope};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_factor_source() -> String {
    "IPCC 2006".to_string()
}

/// Payload for registering an emission factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmissionFactor {
    pub name: String,
    /// kg CO2e per unit
    pub value: f64,
    pub unit: String,
    /// Provenance of the factor
    #[serde(default = "default_factor_source")]
    pub source: String,
}

impl NewEmissionFactor {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("emission factor name must not be empty"));
        }
        if !(self.value.is_finite() && self.value > 0.0) {
            return Err(Error::validation(format!(
                "emission factor value must be positive, got {}",
                self.value
            )));
        }
        if self.unit.trim().is_empty() {
            return Err(Error::validation("emission factor unit must not be empty"));
        }
        Ok(())
    }
}

/// Conversion factor from an activity unit to kg CO2e. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    pub id: i64,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub source: String,
}

/// Payload for registering an emission source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmissionSource {
    pub name: String,
    pub source_type: EmissionSourceType,
    pub scope: GhgScope,
    pub factor_id: i64,
}

impl NewEmissionSource {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("emission source name must not be empty"));
        }
        Ok(())
    }
}

/// Source with its resolved factor (`None` only for rows whose factor link is broken).
/// Labels are read back raw, so rows stored with an unknown scope still list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionSource {
    pub id: i64,
    pub name: String,
    pub source_type: String,
    pub scope: String,
    pub factor: Option<EmissionFactor>,
}

/// Payload for recording one measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivityData {
    /// Amount of activity in the source's unit
    pub value: f64,
    /// Informational only, not checked against the factor unit
    pub unit: String,
    pub activity_date: NaiveDate,
    pub source_id: i64,
}

impl NewActivityData {
    pub fn validate(&self) -> Result<()> {
        if !(self.value.is_finite() && self.value >= 0.0) {
            return Err(Error::validation(format!(
                "activity value must be a non-negative number, got {}",
                self.value
            )));
        }
        Ok(())
    }
}

/// One measurement event. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityData {
    pub id: i64,
    pub value: f64,
    pub unit: String,
    pub activity_date: NaiveDate,
    pub source_id: Option<i64>,
}
