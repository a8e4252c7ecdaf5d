use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

pub const DEFAULT_PICKUP_MINUTES: u32 = 5;

/// Lightweight per-tour view of a booking that still needs a guide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedBooking {
    pub id: Uuid,
    pub passenger_count: u32,
    pub is_private: bool,
    #[serde(default)]
    pub zone: Option<String>,
}

/// Full booking record; the assignment snapshot omits the pickup address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub passenger_count: u32,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub pickup_address_id: Option<Uuid>,
    #[serde(default)]
    pub assigned: bool,
}

impl BookingRecord {
    pub fn as_unassigned(&self) -> UnassignedBooking {
        UnassignedBooking {
            id: self.id,
            passenger_count: self.passenger_count,
            is_private: self.is_private,
            zone: self.zone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupAddress {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub average_pickup_minutes: Option<u32>,
}

impl PickupAddress {
    pub fn pickup_minutes(&self) -> u32 {
        self.average_pickup_minutes.unwrap_or(DEFAULT_PICKUP_MINUTES)
    }
}
