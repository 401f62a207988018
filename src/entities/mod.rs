// Entity Models
//
// Each entity comes as a validated `New*` payload (what a client submits) and one or
// more stored shapes (what the API returns). Summaries are the relation-free form used
// when a record is nested inside another one.

pub mod enums;
pub mod policy;
pub mod aspect;
pub mod risk;
pub mod compliance;
pub mod objective;
pub mod audit;
pub mod ghg;

pub use enums::{
    AspectType, EmissionSourceType, FindingType, GhgScope, LifecycleStage, ObligationType,
    RiskCategory,
};
pub use policy::{EnvironmentalPolicy, NewPolicy};
pub use aspect::{AspectSummary, EnvironmentalAspect, NewAspect};
pub use risk::{risk_level, NewRisk, Risk, RiskSummary};
pub use compliance::{ComplianceObligation, NewObligation, ObligationSummary};
pub use objective::{Indicator, NewIndicator, NewObjective, Objective, ObjectiveSummary};
pub use audit::{Audit, AuditFinding, AuditSummary, NewAudit, NewFinding};
pub use ghg::{
    ActivityData, EmissionFactor, EmissionSource, NewActivityData, NewEmissionFactor,
    NewEmissionSource,
};
