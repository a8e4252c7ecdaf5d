use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    NoCapacity,
    NoQualifiedGuide,
    ExceedsVehicle,
    InefficientRoute,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::NoCapacity => "no_capacity",
            FlagKind::NoQualifiedGuide => "no_qualified_guide",
            FlagKind::ExceedsVehicle => "exceeds_vehicle",
            FlagKind::InefficientRoute => "inefficient_route",
        }
    }
}

/// A booking the engine could not place. Result artifact only, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentFlag {
    pub booking_id: Uuid,
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// One booking placed on one guide during a single engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalAssignment {
    pub booking_id: Uuid,
    pub guide_id: Uuid,
    pub passenger_count: u32,
    pub zone: Option<String>,
    pub is_private: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    Pending,
    Confirmed,
    PickedUp,
    NoShow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPickupAssignment {
    pub schedule_id: Uuid,
    pub guide_assignment_id: Uuid,
    pub guide_id: Uuid,
    pub booking_id: Uuid,
    pub pickup_address_id: Option<Uuid>,
    pub pickup_order: u32,
    pub passenger_count: u32,
    pub status: PickupStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupAssignment {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub guide_assignment_id: Uuid,
    pub guide_id: Uuid,
    pub booking_id: Uuid,
    pub pickup_address_id: Option<Uuid>,
    pub pickup_order: u32,
    pub passenger_count: u32,
    pub status: PickupStatus,
    pub estimated_pickup_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    /// Passengers carried over seats offered, for guides with at least one booking.
    pub vehicle_utilization: f64,
    /// 1 minus the coefficient of variation of bookings per used guide.
    pub guide_balance: f64,
    pub guides_used: usize,
    pub passengers_assigned: u32,
}

impl Default for AssignmentStats {
    fn default() -> Self {
        Self {
            vehicle_utilization: 0.0,
            guide_balance: 1.0,
            guides_used: 0,
            passengers_assigned: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourAssignmentResult {
    pub success: bool,
    pub schedule_id: Uuid,
    pub assigned: usize,
    pub unassigned: usize,
    pub flags: Vec<AssignmentFlag>,
    pub stats: AssignmentStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTourOutcome {
    pub schedule_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TourAssignmentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DayTourOutcome {
    pub fn fully_assigned(&self) -> bool {
        self.result.as_ref().is_some_and(|result| result.success)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAssignmentResult {
    pub date: NaiveDate,
    pub total_tours: usize,
    pub fully_assigned: usize,
    pub needs_attention: usize,
    pub total_assigned: usize,
    pub total_unassigned: usize,
    pub tours: Vec<DayTourOutcome>,
}

/// Advisory ranking entry for the manual assignment screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideSuggestion {
    pub guide_id: Uuid,
    pub guide_name: String,
    pub score: u32,
    pub reasons: Vec<String>,
    pub remaining_capacity: u32,
}
