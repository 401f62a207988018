// 🏷️ Controlled vocabularies
// Every enum is stored and serialized by its display label, so the JSON contract and
// the SQLite column hold the same text ("Scope 1", "Mobile Combustion", ...).

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Exact label match.
            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $( $label => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let label = value.as_str()?;
                $name::from_label(label).ok_or_else(|| {
                    FromSqlError::Other(
                        format!("unknown {} label: {:?}", stringify!($name), label).into(),
                    )
                })
            }
        }
    };
}

labeled_enum! {
    /// Life-cycle stage in which an aspect occurs.
    pub enum LifecycleStage {
        RawMaterialAcquisition => "Raw Material Acquisition",
        DesignAndDevelopment => "Design and Development",
        Manufacturing => "Manufacturing",
        TransportationDistribution => "Transportation and Distribution",
        UseAndService => "Use and Service",
        EndOfLife => "End of Life",
    }
}

labeled_enum! {
    /// Kind of environmental aspect. Also the candidate label set of the classifier.
    pub enum AspectType {
        Emission => "Emission",
        Consumption => "Consumption",
        WasteGeneration => "Waste Generation",
        ResourceUse => "Natural Resource Use",
    }
}

labeled_enum! {
    pub enum RiskCategory {
        Operational => "Operational",
        Compliance => "Legal Compliance",
        ClimatePhysical => "Physical Climate",
        ClimateTransition => "Transition Climate",
        Biodiversity => "Biodiversity",
        Reputational => "Reputational",
    }
}

labeled_enum! {
    pub enum ObligationType {
        Legal => "Legal",
        Permit => "Permit/License",
        Standard => "Voluntary Standard",
        Other => "Other",
    }
}

labeled_enum! {
    /// GHG Protocol organizational boundary.
    pub enum GhgScope {
        /// Direct emissions
        Scope1 => "Scope 1",
        /// Purchased energy
        Scope2 => "Scope 2",
        /// Value chain
        Scope3 => "Scope 3",
    }
}

labeled_enum! {
    pub enum EmissionSourceType {
        StationaryCombustion => "Stationary Combustion",
        MobileCombustion => "Mobile Combustion",
        FugitiveEmissions => "Fugitive Emissions",
        ProcessEmissions => "Process Emissions",
        PurchasedElectricity => "Purchased Electricity",
    }
}

labeled_enum! {
    pub enum FindingType {
        Conformity => "Conformity",
        NonconformityMinor => "Minor Nonconformity",
        NonconformityMajor => "Major Nonconformity",
        OpportunityForImprovement => "Opportunity for Improvement",
    }
}
