// ⚖️ Compliance Obligation - legal requirements, permits and voluntary standards

use super::aspect::AspectSummary;
use super::enums::ObligationType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObligation {
    pub name: String,
    pub description: String,
    /// Issuing body or legal reference
    pub source: String,
    pub obligation_type: ObligationType,
}

impl NewObligation {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("obligation name must not be empty"));
        }
        Ok(())
    }
}

/// Obligation without linked aspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub source: String,
    pub obligation_type: ObligationType,
}

/// Obligation with the aspects it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceObligation {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub source: String,
    pub obligation_type: ObligationType,
    #[serde(default)]
    pub aspects: Vec<AspectSummary>,
}
