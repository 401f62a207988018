// 🎯 Objectives & Indicators - measurable targets and their tracked values

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObjective {
    pub description: String,
    pub target_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewObjective {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("objective description must not be empty"));
        }
        if !self.target_value.is_finite() {
            return Err(Error::validation("objective target must be a finite number"));
        }
        if self.end_date < self.start_date {
            return Err(Error::validation(format!(
                "objective ends ({}) before it starts ({})",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSummary {
    pub id: i64,
    pub description: String,
    pub target_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIndicator {
    pub name: String,
    pub current_value: f64,
    pub unit: String,
}

impl NewIndicator {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("indicator name must not be empty"));
        }
        if !self.current_value.is_finite() {
            return Err(Error::validation("indicator value must be a finite number"));
        }
        Ok(())
    }
}

/// Indicator, carrying the objective it measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: i64,
    pub name: String,
    pub current_value: f64,
    pub unit: String,
    pub objective: ObjectiveSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: i64,
    pub description: String,
    pub target_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
}

impl Objective {
    pub fn summary(&self) -> ObjectiveSummary {
        ObjectiveSummary {
            id: self.id,
            description: self.description.clone(),
            target_value: self.target_value,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Share of the target reached by the latest indicator, if any.
    ///
    /// Returns `None` when there is no indicator or the target is zero.
    pub fn progress(&self) -> Option<f64> {
        let latest = self.indicators.iter().max_by_key(|i| i.id)?;
        if self.target_value == 0.0 {
            return None;
        }
        Some(latest.current_value / self.target_value)
    }
}
