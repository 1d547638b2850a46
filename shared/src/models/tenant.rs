use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A cafe location. All catalog entities and orders belong to exactly
/// one tenant, and cross-tenant access is always rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub subscription_plan: String,
    /// IANA timezone name, e.g. "Europe/Lisbon". Drives the business
    /// date used for order numbering.
    pub timezone: String,
    pub is_active: bool,
    pub created_at: i64,
}

impl Tenant {
    /// Parse the stored timezone, falling back to UTC on bad data.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}
