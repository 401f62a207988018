// Data access
//
// Plain functions over a borrowed `rusqlite::Connection`, one module per service.
// Every write validates its payload first and logs the operation; relation loading
// is done eagerly so callers always get fully nested records.

pub mod management;
pub mod risk;
pub mod compliance;
pub mod objectives;
pub mod audit;
pub mod ghg;

use serde::Deserialize;

fn default_limit() -> u32 {
    100
}

/// `skip` / `limit` pagination, as accepted by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Page {
    pub fn new(skip: u32, limit: u32) -> Self {
        Page { skip, limit }
    }

    /// Cap `limit` at `max`.
    pub fn clamped(self, max: u32) -> Self {
        Page {
            skip: self.skip,
            limit: self.limit.min(max),
        }
    }
}
