//! Read/write seams to the persistence layer.
//!
//! The engines only ever see these traits. `MemoryStore` backs the service
//! binary and the test suites.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::assignment::{NewPickupAssignment, PickupAssignment};
use crate::models::booking::{BookingRecord, PickupAddress};
use crate::models::option::BookingOption;
use crate::models::schedule::{DayOverview, Departure, SlotUsage, Tour, TourAssignmentSnapshot};

pub use memory::{MemoryStore, StoreSeed};

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Unassigned bookings, candidate guides and existing guide links for one departure.
    async fn get_tour_assignment_data(
        &self,
        schedule_id: Uuid,
    ) -> Result<TourAssignmentSnapshot, AppError>;

    async fn get_day_overview(&self, date: NaiveDate) -> Result<DayOverview, AppError>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<BookingRecord, AppError>;

    async fn get_pickup_address(
        &self,
        address_id: Uuid,
    ) -> Result<Option<PickupAddress>, AppError>;

    /// Returns the guide's assignment id for this departure, creating it on first use.
    async fn find_or_create_guide_assignment(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        guide_id: Uuid,
    ) -> Result<Uuid, AppError>;

    async fn insert_pickup_assignments(
        &self,
        rows: Vec<NewPickupAssignment>,
    ) -> Result<Vec<PickupAssignment>, AppError>;

    /// Every pickup a guide holds on one departure, in current route order.
    async fn list_guide_pickups(
        &self,
        schedule_id: Uuid,
        guide_id: Uuid,
    ) -> Result<Vec<PickupAssignment>, AppError>;

    async fn update_pickup_schedule(
        &self,
        pickup_id: Uuid,
        pickup_order: u32,
        estimated_pickup_time: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn get_tour(&self, tour_id: Uuid) -> Result<Tour, AppError>;

    async fn list_booking_options(&self, tour_id: Uuid) -> Result<Vec<BookingOption>, AppError>;

    /// Departures of the tour on a date, earliest first.
    async fn list_departures(
        &self,
        tour_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Departure>, AppError>;

    async fn slot_usage(&self, schedule_id: Uuid, option_id: Uuid) -> Result<SlotUsage, AppError>;
}
