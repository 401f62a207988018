// 🌍 GHG Inventory Calculator
// Emissions = activity value × emission factor, summed overall and per scope.
//
// The calculator works on already-joined rows: every activity carries its source (if
// the reference resolved) and the source carries its factor (if linked). Rows that do
// not resolve all the way contribute nothing. A scope label outside the three fixed
// buckets still counts toward the total.

use crate::entities::{ActivityData, EmissionFactor, GhgScope};
use serde::{Deserialize, Serialize};

// ============================================================================
// INPUT
// ============================================================================

/// Source as seen through the activity join. Labels are kept raw so that rows written
/// with an unexpected scope do not break the read path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub id: i64,
    pub name: String,
    pub source_type: String,
    pub scope: String,
    pub factor: Option<EmissionFactor>,
}

/// One activity row with whatever its references resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub activity: ActivityData,
    pub source: Option<ResolvedSource>,
}

impl ActivityEntry {
    /// kg CO2e contributed by this row, or `None` if source or factor is missing.
    pub fn co2e(&self) -> Option<f64> {
        let factor = self.source.as_ref()?.factor.as_ref()?;
        Some(self.activity.value * factor.value)
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Per-scope subtotals. Always serializes all three keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeBreakdown {
    #[serde(rename = "Scope 1")]
    pub scope_1: f64,
    #[serde(rename = "Scope 2")]
    pub scope_2: f64,
    #[serde(rename = "Scope 3")]
    pub scope_3: f64,
}

impl ScopeBreakdown {
    pub fn get(&self, scope: GhgScope) -> f64 {
        match scope {
            GhgScope::Scope1 => self.scope_1,
            GhgScope::Scope2 => self.scope_2,
            GhgScope::Scope3 => self.scope_3,
        }
    }

    fn add(&mut self, scope: GhgScope, amount: f64) {
        match scope {
            GhgScope::Scope1 => self.scope_1 += amount,
            GhgScope::Scope2 => self.scope_2 += amount,
            GhgScope::Scope3 => self.scope_3 += amount,
        }
    }

    /// Sum of the visible buckets (can be below the inventory total, see module docs).
    pub fn sum(&self) -> f64 {
        self.scope_1 + self.scope_2 + self.scope_3
    }
}

/// Aggregate inventory for a reporting period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GhgInventory {
    pub total_co2e: f64,
    pub emissions_by_scope: ScopeBreakdown,
}

/// Inventory plus counters describing how the input was treated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InventorySummary {
    pub inventory: GhgInventory,
    /// Rows that contributed to the total
    pub contributing: usize,
    /// Rows skipped because the source or factor did not resolve
    pub excluded: usize,
    /// Contributing rows whose scope matched no bucket
    pub unbucketed: usize,
}

// ============================================================================
// CALCULATION
// ============================================================================

/// Aggregate activity rows and report how many were excluded.
pub fn summarize(entries: &[ActivityEntry]) -> InventorySummary {
    let mut summary = InventorySummary::default();

    for entry in entries {
        let Some(co2e) = entry.co2e() else {
            summary.excluded += 1;
            continue;
        };

        summary.contributing += 1;
        summary.inventory.total_co2e += co2e;

        // co2e() returned Some, so the source is present
        let scope_label = entry.source.as_ref().map(|s| s.scope.as_str()).unwrap_or("");
        match GhgScope::from_label(scope_label) {
            Some(scope) => summary.inventory.emissions_by_scope.add(scope, co2e),
            None => summary.unbucketed += 1,
        }
    }

    summary
}

/// Compute the inventory for a set of activity rows.
pub fn calculate_emissions(entries: &[ActivityEntry]) -> GhgInventory {
    summarize(entries).inventory
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn factor(id: i64, value: f64) -> EmissionFactor {
        EmissionFactor {
            id,
            name: format!("factor-{}", id),
            value,
            unit: "liter".to_string(),
            source: "IPCC 2006".to_string(),
        }
    }

    fn entry(id: i64, value: f64, scope: &str, factor: Option<EmissionFactor>) -> ActivityEntry {
        ActivityEntry {
            activity: ActivityData {
                id,
                value,
                unit: "liter".to_string(),
                activity_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                source_id: Some(1),
            },
            source: Some(ResolvedSource {
                id: 1,
                name: "Company Vehicle Fleet".to_string(),
                source_type: "Mobile Combustion".to_string(),
                scope: scope.to_string(),
                factor,
            }),
        }
    }

    fn orphan(id: i64, value: f64) -> ActivityEntry {
        ActivityEntry {
            activity: ActivityData {
                id,
                value,
                unit: "kWh".to_string(),
                activity_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                source_id: None,
            },
            source: None,
        }
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let inventory = calculate_emissions(&[]);

        assert_eq!(inventory.total_co2e, 0.0);
        for scope in GhgScope::ALL {
            assert_eq!(inventory.emissions_by_scope.get(*scope), 0.0);
        }
    }

    #[test]
    fn test_single_contribution() {
        let inventory = calculate_emissions(&[entry(1, 10.0, "Scope 1", Some(factor(1, 2.5)))]);

        assert_eq!(inventory.total_co2e, 25.0);
        assert_eq!(inventory.emissions_by_scope.scope_1, 25.0);
        assert_eq!(inventory.emissions_by_scope.scope_2, 0.0);
        assert_eq!(inventory.emissions_by_scope.scope_3, 0.0);
    }

    #[test]
    fn test_multiple_scopes() {
        let entries = vec![
            entry(1, 4.0, "Scope 1", Some(factor(1, 2.5))),
            entry(2, 10.0, "Scope 2", Some(factor(2, 0.5))),
        ];
        let inventory = calculate_emissions(&entries);

        assert_eq!(inventory.total_co2e, 15.0);
        assert_eq!(inventory.emissions_by_scope.scope_1, 10.0);
        assert_eq!(inventory.emissions_by_scope.scope_2, 5.0);
        assert_eq!(inventory.emissions_by_scope.scope_3, 0.0);
    }

    #[test]
    fn test_missing_factor_contributes_nothing() {
        let entries = vec![
            entry(1, 10.0, "Scope 1", Some(factor(1, 2.5))),
            entry(2, 1000.0, "Scope 1", None),
        ];
        let summary = summarize(&entries);

        assert_eq!(summary.inventory.total_co2e, 25.0);
        assert_eq!(summary.inventory.emissions_by_scope.scope_1, 25.0);
        assert_eq!(summary.contributing, 1);
        assert_eq!(summary.excluded, 1);
    }

    #[test]
    fn test_missing_source_behaves_like_missing_factor() {
        let with_missing_source = summarize(&[orphan(1, 500.0)]);
        let with_missing_factor = summarize(&[entry(1, 500.0, "Scope 2", None)]);

        assert_eq!(with_missing_source.inventory, GhgInventory::default());
        assert_eq!(with_missing_source.inventory, with_missing_factor.inventory);
        assert_eq!(with_missing_source.excluded, 1);
    }

    #[test]
    fn test_unknown_scope_counts_toward_total_only() {
        let entries = vec![
            entry(1, 10.0, "Scope 1", Some(factor(1, 1.0))),
            entry(2, 10.0, "Alcance 9", Some(factor(1, 1.0))),
        ];
        let summary = summarize(&entries);

        assert_eq!(summary.inventory.total_co2e, 20.0);
        assert_eq!(summary.inventory.emissions_by_scope.sum(), 10.0);
        assert_eq!(summary.unbucketed, 1);
    }

    #[test]
    fn test_calculation_is_idempotent() {
        let entries = vec![
            entry(1, 3.3, "Scope 1", Some(factor(1, 2.31))),
            entry(2, 120.0, "Scope 2", Some(factor(2, 0.82))),
            entry(3, 7.0, "Scope 3", Some(factor(3, 1.1))),
            orphan(4, 9.0),
        ];

        let first = calculate_emissions(&entries);
        let second = calculate_emissions(&entries);
        assert_eq!(first, second);
    }

    #[test]
    fn test_splitting_a_record_preserves_totals() {
        let whole = calculate_emissions(&[entry(1, 100.0, "Scope 1", Some(factor(1, 2.68)))]);
        let split = calculate_emissions(&[
            entry(1, 37.5, "Scope 1", Some(factor(1, 2.68))),
            entry(2, 62.5, "Scope 1", Some(factor(1, 2.68))),
        ]);

        assert!((whole.total_co2e - split.total_co2e).abs() < 1e-9);
        assert!(
            (whole.emissions_by_scope.scope_1 - split.emissions_by_scope.scope_1).abs() < 1e-9
        );
    }

    #[test]
    fn test_json_shape() {
        let inventory = calculate_emissions(&[entry(1, 10.0, "Scope 1", Some(factor(1, 2.5)))]);
        let json = serde_json::to_value(inventory).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "total_co2e": 25.0,
                "emissions_by_scope": {"Scope 1": 25.0, "Scope 2": 0.0, "Scope 3": 0.0}
            })
        );
    }
}
