use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::UnassignedBooking;
use crate::models::guide::AvailableGuide;
use crate::models::pricing::Money;

/// One bookable departure of a tour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSchedule {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub tour_id: Uuid,
    pub date: NaiveDate,
    pub departure: DateTime<Utc>,
}

impl TourSchedule {
    pub fn departure_time(&self) -> NaiveTime {
        self.departure.time()
    }
}

/// Links one guide to one departure; parent of that guide's pickups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideAssignment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub schedule_id: Uuid,
    pub booking_id: Uuid,
    pub guide_id: Uuid,
}

/// A guide assignment that already existed before this run, with its load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingGuideAssignment {
    pub id: Uuid,
    pub guide_id: Uuid,
    pub passenger_count: u32,
    pub pickup_count: u32,
    pub vehicle_capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourAssignmentSnapshot {
    pub schedule: TourSchedule,
    pub unassigned_bookings: Vec<UnassignedBooking>,
    pub available_guides: Vec<AvailableGuide>,
    pub existing_guide_assignments: Vec<ExistingGuideAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTour {
    pub schedule_id: Uuid,
    pub tour_id: Uuid,
    pub departure: DateTime<Utc>,
    pub unassigned_bookings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOverview {
    pub date: NaiveDate,
    pub tours: Vec<DayTour>,
    pub total_unassigned: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    /// Flat per-guest price used when no booking options are configured.
    pub base_price: Money,
    pub max_group_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    pub schedule_id: Uuid,
    pub time: NaiveTime,
}

/// Capacity already sold for one booking option on one departure.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUsage {
    pub booked_seats: u32,
    pub booked_units: u32,
}
