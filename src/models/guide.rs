use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableGuide {
    pub id: Uuid,
    pub name: String,
    /// Seats still free in the guide's vehicle for this departure.
    pub available_capacity: u32,
    pub vehicle_capacity: u32,
    #[serde(default)]
    pub preferred_zones: HashSet<String>,
    #[serde(default)]
    pub current_load: u32,
    /// Booked on another departure overlapping this one.
    #[serde(default)]
    pub has_conflict: bool,
}

impl AvailableGuide {
    pub fn prefers(&self, zone: &str) -> bool {
        self.preferred_zones.contains(zone)
    }
}
