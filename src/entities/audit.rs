// 🔍 Audits & Findings

use super::enums::FindingType;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAudit {
    /// Areas or processes covered by the audit
    pub scope: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewAudit {
    pub fn validate(&self) -> Result<()> {
        if self.scope.trim().is_empty() {
            return Err(Error::validation("audit scope must not be empty"));
        }
        if self.end_date < self.start_date {
            return Err(Error::validation(format!(
                "audit ends ({}) before it starts ({})",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub id: i64,
    pub scope: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFinding {
    pub description: String,
    /// Observed evidence supporting the finding
    pub evidence: String,
    /// Clause of the audited standard, e.g. "ISO 14001: 6.1.2"
    pub clause: String,
    pub finding_type: FindingType,
}

impl NewFinding {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("finding description must not be empty"));
        }
        if self.clause.trim().is_empty() {
            return Err(Error::validation("finding clause must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub id: i64,
    pub description: String,
    pub evidence: String,
    pub clause: String,
    pub finding_type: FindingType,
    pub audit: AuditSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub id: i64,
    pub scope: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub findings: Vec<AuditFinding>,
}

impl Audit {
    pub fn summary(&self) -> AuditSummary {
        AuditSummary {
            id: self.id,
            scope: self.scope.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}
