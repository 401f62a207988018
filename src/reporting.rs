// 📄 Sustainability reporting
// Pulls policy, significant aspects, top risks, objectives and the GHG inventory from
// the other services in parallel and renders them into a Markdown document. A service
// that cannot be reached leaves its section empty; the report is still produced.

use crate::config::Config;
use crate::entities::{EnvironmentalAspect, EnvironmentalPolicy, Objective, Risk};
use crate::error::{Error, Result};
use crate::http_client::{ServiceClient, ServiceError};
use crate::inventory::GhgInventory;
use chrono::NaiveDate;
use minijinja::Environment;
use serde::{Deserialize, Serialize};

const REPORT_TEMPLATE: &str = include_str!("../templates/report.md.j2");

/// How many aspects are requested from core before filtering on significance.
const ASPECT_FETCH_LIMIT: u32 = 500;

/// Number of risks shown in the report.
const TOP_RISKS: usize = 5;

// ============================================================================
// REQUEST / REPORT MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub company_name: String,
    pub reporting_period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportRequest {
    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(Error::validation("company_name must not be empty"));
        }
        if self.start_date > self.end_date {
            return Err(Error::validation("start_date must not be after end_date"));
        }
        Ok(())
    }
}

/// Objective as presented in the report, with progress already worked out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveProgress {
    pub description: String,
    pub target_value: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub progress_pct: Option<f64>,
}

impl From<&Objective> for ObjectiveProgress {
    fn from(objective: &Objective) -> Self {
        ObjectiveProgress {
            description: objective.description.clone(),
            target_value: objective.target_value,
            start_date: objective.start_date,
            end_date: objective.end_date,
            progress_pct: objective.progress().map(|p| p * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SustainabilityReport {
    pub company_name: String,
    pub reporting_period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub policy: Option<EnvironmentalPolicy>,
    /// Human-readable commitments declared in the policy
    pub commitments: Vec<&'static str>,
    pub significant_aspects: Vec<EnvironmentalAspect>,
    pub top_risks: Vec<Risk>,
    pub objectives: Vec<ObjectiveProgress>,
    pub ghg_inventory: Option<GhgInventory>,
}

fn policy_commitments(policy: &EnvironmentalPolicy) -> Vec<&'static str> {
    let mut commitments = Vec::with_capacity(policy.commitment_count());
    if policy.includes_climate_commitment {
        commitments.push("climate change mitigation");
    }
    if policy.includes_circular_economy_commitment {
        commitments.push("the circular economy");
    }
    if policy.includes_biodiversity_commitment {
        commitments.push("biodiversity protection");
    }
    commitments
}

/// Highest `risk_level` first; ties keep their input order.
fn top_risks(mut risks: Vec<Risk>, n: usize) -> Vec<Risk> {
    risks.sort_by(|a, b| b.risk_level.cmp(&a.risk_level));
    risks.truncate(n);
    risks
}

// ============================================================================
// COLLECTION
// ============================================================================

/// Clients for the services the report reads from.
#[derive(Debug, Clone)]
pub struct ReportSources {
    pub core: ServiceClient,
    pub risk: ServiceClient,
    pub objectives: ServiceClient,
    pub ghg: ServiceClient,
}

impl ReportSources {
    pub fn from_config(config: &Config) -> std::result::Result<Self, ServiceError> {
        Ok(ReportSources {
            core: ServiceClient::new("core", &config.urls.core, &config.client)?,
            risk: ServiceClient::new("risk", &config.urls.risk, &config.client)?,
            objectives: ServiceClient::new("objectives", &config.urls.objectives, &config.client)?,
            ghg: ServiceClient::new("ghg", &config.urls.ghg, &config.client)?,
        })
    }
}

fn degrade<T>(section: &str, result: std::result::Result<T, ServiceError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(section, error = %err, "Report section unavailable");
            None
        }
    }
}

/// Fetch every section concurrently and assemble the report.
pub async fn collect(sources: &ReportSources, request: &ReportRequest) -> SustainabilityReport {
    let limit = [("limit", ASPECT_FETCH_LIMIT.to_string())];
    let period = [
        ("start_date", request.start_date.to_string()),
        ("end_date", request.end_date.to_string()),
    ];

    let (policy, aspects, risks, objectives, inventory) = tokio::join!(
        sources.core.get_json::<EnvironmentalPolicy>("/policy", &[]),
        sources.core.get_json::<Vec<EnvironmentalAspect>>("/aspects", &limit),
        sources.risk.get_json::<Vec<Risk>>("/risks/", &limit),
        sources.objectives.get_json::<Vec<Objective>>("/objectives/", &[]),
        sources.ghg.get_json::<GhgInventory>("/inventory/", &period),
    );

    let policy = degrade("policy", policy);
    let significant_aspects = degrade("aspects", aspects)
        .unwrap_or_default()
        .into_iter()
        .filter(|a| a.is_significant)
        .collect();
    let top_risks = top_risks(degrade("risks", risks).unwrap_or_default(), TOP_RISKS);
    let objectives = degrade("objectives", objectives)
        .unwrap_or_default()
        .iter()
        .map(ObjectiveProgress::from)
        .collect();
    let ghg_inventory = degrade("ghg_inventory", inventory);

    SustainabilityReport {
        company_name: request.company_name.clone(),
        reporting_period: request.reporting_period.clone(),
        start_date: request.start_date,
        end_date: request.end_date,
        commitments: policy.as_ref().map(policy_commitments).unwrap_or_default(),
        policy,
        significant_aspects,
        top_risks,
        objectives,
        ghg_inventory,
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_filter("number", |value: f64| format!("{:.2}", value));
    env.add_template("report.md", REPORT_TEMPLATE)?;
    Ok(env)
}

pub fn render(report: &SustainabilityReport) -> Result<String> {
    let env = environment()?;
    let template = env.get_template("report.md")?;
    Ok(template.render(minijinja::context! { report => report })?)
}

/// Collect and render in one go.
pub async fn generate(sources: &ReportSources, request: &ReportRequest) -> Result<String> {
    request.validate()?;
    let report = collect(sources, request).await;
    tracing::info!(
        company = %report.company_name,
        aspects = report.significant_aspects.len(),
        risks = report.top_risks.len(),
        objectives = report.objectives.len(),
        has_inventory = report.ghg_inventory.is_some(),
        "Sustainability report assembled"
    );
    render(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RiskCategory;
    use crate::inventory::ScopeBreakdown;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn risk(id: i64, probability: u8, impact: u8) -> Risk {
        Risk {
            id,
            description: format!("risk-{}", id),
            category: RiskCategory::Operational,
            probability,
            impact,
            aspect_id: Some(1),
            risk_level: crate::entities::risk_level(probability, impact),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn empty_report() -> SustainabilityReport {
        SustainabilityReport {
            company_name: "Acme Logistics".to_string(),
            reporting_period: "FY2024".to_string(),
            start_date: date("2024-01-01"),
            end_date: date("2024-12-31"),
            policy: None,
            commitments: Vec::new(),
            significant_aspects: Vec::new(),
            top_risks: Vec::new(),
            objectives: Vec::new(),
            ghg_inventory: None,
        }
    }

    #[test]
    fn test_top_risks_ranked_by_level() {
        let risks = vec![risk(1, 1, 1), risk(2, 5, 5), risk(3, 2, 3), risk(4, 3, 2), risk(5, 4, 4)];
        let ids: Vec<i64> = top_risks(risks, 3).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 5, 3]);
    }

    #[test]
    fn test_render_with_missing_sections() {
        let markdown = render(&empty_report()).unwrap();

        assert!(markdown.contains("# Sustainability Report: Acme Logistics"));
        assert!(markdown.contains("No environmental policy has been published"));
        assert!(markdown.contains("The GHG inventory could not be retrieved"));
    }

    #[test]
    fn test_render_inventory_and_objectives() {
        let mut report = empty_report();
        report.ghg_inventory = Some(GhgInventory {
            total_co2e: 1234.5,
            emissions_by_scope: ScopeBreakdown {
                scope_1: 1000.0,
                scope_2: 234.5,
                scope_3: 0.0,
            },
        });
        report.objectives.push(ObjectiveProgress {
            description: "Cut fleet diesel by 10%".to_string(),
            target_value: 10.0,
            start_date: date("2024-01-01"),
            end_date: date("2024-12-31"),
            progress_pct: Some(40.0),
        });
        report.top_risks.push(risk(9, 4, 5));

        let markdown = render(&report).unwrap();
        assert!(markdown.contains("Total emissions: **1234.50 kg CO2e**"));
        assert!(markdown.contains("| Scope 2 | 234.50 |"));
        assert!(markdown.contains("40.00% achieved"));
        assert!(markdown.contains("| risk-9 | Operational | 4 | 5 | 20 |"));
    }

    #[test]
    fn test_request_validation() {
        let request = ReportRequest {
            company_name: "Acme".to_string(),
            reporting_period: "2024".to_string(),
            start_date: date("2024-12-31"),
            end_date: date("2024-01-01"),
        };
        assert!(matches!(request.validate(), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_unreachable_services_degrade() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = Config::default();
        config.client.max_retries = 1;
        config.client.timeout = std::time::Duration::from_millis(200);
        let base = format!("http://{}/api/v1", addr);
        config.urls.core = base.clone();
        config.urls.risk = base.clone();
        config.urls.objectives = base.clone();
        config.urls.ghg = base;

        let sources = ReportSources::from_config(&config).unwrap();
        let request = ReportRequest {
            company_name: "Acme".to_string(),
            reporting_period: "2024".to_string(),
            start_date: date("2024-01-01"),
            end_date: date("2024-12-31"),
        };

        let markdown = generate(&sources, &request).await.unwrap();
        assert!(markdown.contains("No significant aspects were identified."));
        assert!(markdown.contains("No risks are registered."));
    }
}
