use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::assignment::{NewPickupAssignment, PickupAssignment};
use crate::models::booking::{BookingRecord, PickupAddress};
use crate::models::guide::AvailableGuide;
use crate::models::option::BookingOption;
use crate::models::schedule::{
    DayOverview, DayTour, Departure, ExistingGuideAssignment, GuideAssignment, SlotUsage, Tour,
    TourAssignmentSnapshot, TourSchedule,
};
use crate::store::{AssignmentRepository, AvailabilityRepository};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideProfile {
    pub id: Uuid,
    pub name: String,
    pub vehicle_capacity: u32,
    #[serde(default)]
    pub preferred_zones: HashSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub guide_id: Uuid,
    #[serde(default)]
    pub has_conflict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSeed {
    pub schedule_id: Uuid,
    pub guides: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotUsageSeed {
    pub schedule_id: Uuid,
    pub option_id: Uuid,
    #[serde(flatten)]
    pub usage: SlotUsage,
}

/// JSON document used to populate a `MemoryStore`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSeed {
    pub tours: Vec<Tour>,
    pub schedules: Vec<TourSchedule>,
    pub bookings: Vec<BookingRecord>,
    pub guides: Vec<GuideProfile>,
    pub rosters: Vec<RosterSeed>,
    pub addresses: Vec<PickupAddress>,
    pub booking_options: Vec<BookingOption>,
    pub slot_usage: Vec<SlotUsageSeed>,
}

#[derive(Default)]
pub struct MemoryStore {
    tours: DashMap<Uuid, Tour>,
    schedules: DashMap<Uuid, TourSchedule>,
    bookings: DashMap<Uuid, BookingRecord>,
    schedule_bookings: DashMap<Uuid, Vec<Uuid>>,
    guides: DashMap<Uuid, GuideProfile>,
    rosters: DashMap<Uuid, Vec<RosterEntry>>,
    addresses: DashMap<Uuid, PickupAddress>,
    booking_options: DashMap<Uuid, BookingOption>,
    slot_usage: DashMap<(Uuid, Uuid), SlotUsage>,
    guide_assignments: DashMap<Uuid, GuideAssignment>,
    pickups: DashMap<Uuid, PickupAssignment>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: StoreSeed) -> Self {
        let store = Self::new();
        store.load(seed);
        store
    }

    pub fn load(&self, seed: StoreSeed) {
        for tour in seed.tours {
            self.insert_tour(tour);
        }
        for schedule in seed.schedules {
            self.insert_schedule(schedule);
        }
        for booking in seed.bookings {
            self.insert_booking(booking);
        }
        for guide in seed.guides {
            self.insert_guide(guide);
        }
        for roster in seed.rosters {
            self.set_roster(roster.schedule_id, roster.guides);
        }
        for address in seed.addresses {
            self.insert_address(address);
        }
        for option in seed.booking_options {
            self.insert_booking_option(option);
        }
        for entry in seed.slot_usage {
            self.set_slot_usage(entry.schedule_id, entry.option_id, entry.usage);
        }
    }

    pub fn insert_tour(&self, tour: Tour) {
        self.tours.insert(tour.id, tour);
    }

    pub fn insert_schedule(&self, schedule: TourSchedule) {
        self.schedules.insert(schedule.id, schedule);
    }

    pub fn insert_booking(&self, booking: BookingRecord) {
        self.schedule_bookings
            .entry(booking.schedule_id)
            .or_default()
            .push(booking.id);
        self.bookings.insert(booking.id, booking);
    }

    pub fn insert_guide(&self, guide: GuideProfile) {
        self.guides.insert(guide.id, guide);
    }

    pub fn set_roster(&self, schedule_id: Uuid, entries: Vec<RosterEntry>) {
        self.rosters.insert(schedule_id, entries);
    }

    pub fn insert_address(&self, address: PickupAddress) {
        self.addresses.insert(address.id, address);
    }

    pub fn insert_booking_option(&self, option: BookingOption) {
        self.booking_options.insert(option.id, option);
    }

    pub fn set_slot_usage(&self, schedule_id: Uuid, option_id: Uuid, usage: SlotUsage) {
        self.slot_usage.insert((schedule_id, option_id), usage);
    }

    /// Number of mutating calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn schedule_count(&self) -> usize {
        self.schedules.len()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    pub fn pickup_count(&self) -> usize {
        self.pickups.len()
    }

    /// Pickups of a departure ordered by guide and pickup order.
    pub fn pickups_for_schedule(&self, schedule_id: Uuid) -> Vec<PickupAssignment> {
        let mut pickups: Vec<PickupAssignment> = self
            .pickups
            .iter()
            .filter(|entry| entry.value().schedule_id == schedule_id)
            .map(|entry| entry.value().clone())
            .collect();
        pickups.sort_by_key(|pickup| (pickup.guide_id, pickup.pickup_order));
        pickups
    }

    fn schedule(&self, schedule_id: Uuid) -> Result<TourSchedule, AppError> {
        self.schedules
            .get(&schedule_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("schedule {} not found", schedule_id)))
    }

    fn bookings_of(&self, schedule_id: Uuid) -> Vec<BookingRecord> {
        let ids = self
            .schedule_bookings
            .get(&schedule_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        ids.iter()
            .filter_map(|id| self.bookings.get(id).map(|entry| entry.value().clone()))
            .collect()
    }

    fn passengers_on(&self, schedule_ids: &HashSet<Uuid>, guide_id: Uuid) -> (u32, u32) {
        self.pickups
            .iter()
            .filter(|entry| {
                let pickup = entry.value();
                pickup.guide_id == guide_id && schedule_ids.contains(&pickup.schedule_id)
            })
            .fold((0, 0), |(passengers, stops), entry| {
                (passengers + entry.value().passenger_count, stops + 1)
            })
    }

    /// A private booking already rides with this guide on the departure.
    fn carries_private_party(&self, schedule_id: Uuid, guide_id: Uuid) -> bool {
        self.pickups.iter().any(|entry| {
            let pickup = entry.value();
            pickup.schedule_id == schedule_id
                && pickup.guide_id == guide_id
                && self
                    .bookings
                    .get(&pickup.booking_id)
                    .is_some_and(|booking| booking.is_private)
        })
    }

    fn schedules_on(&self, date: NaiveDate) -> HashSet<Uuid> {
        self.schedules
            .iter()
            .filter(|entry| entry.value().date == date)
            .map(|entry| entry.value().id)
            .collect()
    }

    /// Guide already leads another departure leaving at the same moment.
    fn booked_elsewhere(&self, schedule: &TourSchedule, guide_id: Uuid) -> bool {
        let other_schedules: Vec<Uuid> = self
            .guide_assignments
            .iter()
            .filter(|entry| {
                let link = entry.value();
                link.guide_id == guide_id && link.schedule_id != schedule.id
            })
            .map(|entry| entry.value().schedule_id)
            .collect();

        other_schedules.iter().any(|id| {
            self.schedules
                .get(id)
                .is_some_and(|other| other.value().departure == schedule.departure)
        })
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn get_tour_assignment_data(
        &self,
        schedule_id: Uuid,
    ) -> Result<TourAssignmentSnapshot, AppError> {
        let schedule = self.schedule(schedule_id)?;

        let unassigned_bookings = self
            .bookings_of(schedule_id)
            .iter()
            .filter(|booking| !booking.assigned)
            .map(BookingRecord::as_unassigned)
            .collect();

        let roster = self
            .rosters
            .get(&schedule_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let this_schedule = HashSet::from([schedule_id]);
        let same_day = self.schedules_on(schedule.date);

        let mut available_guides = Vec::with_capacity(roster.len());
        for entry in roster {
            let profile = self
                .guides
                .get(&entry.guide_id)
                .map(|guide| guide.value().clone())
                .ok_or_else(|| AppError::NotFound(format!("guide {} not found", entry.guide_id)))?;

            let (on_this_tour, _) = self.passengers_on(&this_schedule, profile.id);
            let (day_load, _) = self.passengers_on(&same_day, profile.id);
            let available_capacity = if self.carries_private_party(schedule_id, profile.id) {
                0
            } else {
                profile.vehicle_capacity.saturating_sub(on_this_tour)
            };

            available_guides.push(AvailableGuide {
                id: profile.id,
                name: profile.name,
                available_capacity,
                vehicle_capacity: profile.vehicle_capacity,
                preferred_zones: profile.preferred_zones,
                current_load: day_load,
                has_conflict: entry.has_conflict || self.booked_elsewhere(&schedule, profile.id),
            });
        }

        let links: Vec<GuideAssignment> = self
            .guide_assignments
            .iter()
            .filter(|entry| entry.value().schedule_id == schedule_id)
            .map(|entry| entry.value().clone())
            .collect();

        let mut existing_guide_assignments: Vec<ExistingGuideAssignment> = links
            .into_iter()
            .map(|link| {
                let (passenger_count, pickup_count) =
                    self.passengers_on(&this_schedule, link.guide_id);
                let vehicle_capacity = self
                    .guides
                    .get(&link.guide_id)
                    .map(|guide| guide.value().vehicle_capacity)
                    .unwrap_or(0);

                ExistingGuideAssignment {
                    id: link.id,
                    guide_id: link.guide_id,
                    passenger_count,
                    pickup_count,
                    vehicle_capacity,
                }
            })
            .collect();
        existing_guide_assignments.sort_by_key(|link| link.id);

        Ok(TourAssignmentSnapshot {
            schedule,
            unassigned_bookings,
            available_guides,
            existing_guide_assignments,
        })
    }

    async fn get_day_overview(&self, date: NaiveDate) -> Result<DayOverview, AppError> {
        let mut schedules: Vec<TourSchedule> = self
            .schedules
            .iter()
            .filter(|entry| entry.value().date == date)
            .map(|entry| entry.value().clone())
            .collect();
        schedules.sort_by_key(|schedule| (schedule.departure, schedule.id));

        let tours: Vec<DayTour> = schedules
            .into_iter()
            .map(|schedule| DayTour {
                schedule_id: schedule.id,
                tour_id: schedule.tour_id,
                departure: schedule.departure,
                unassigned_bookings: self
                    .bookings_of(schedule.id)
                    .iter()
                    .filter(|booking| !booking.assigned)
                    .count(),
            })
            .collect();

        let total_unassigned = tours.iter().map(|tour| tour.unassigned_bookings).sum();

        Ok(DayOverview {
            date,
            tours,
            total_unassigned,
        })
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<BookingRecord, AppError> {
        self.bookings
            .get(&booking_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", booking_id)))
    }

    async fn get_pickup_address(
        &self,
        address_id: Uuid,
    ) -> Result<Option<PickupAddress>, AppError> {
        Ok(self
            .addresses
            .get(&address_id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_or_create_guide_assignment(
        &self,
        organization_id: Uuid,
        schedule_id: Uuid,
        guide_id: Uuid,
    ) -> Result<Uuid, AppError> {
        let anchor_booking = self
            .schedule_bookings
            .get(&schedule_id)
            .and_then(|entry| entry.value().first().copied())
            .ok_or_else(|| {
                AppError::Validation(format!("no bookings exist for schedule {}", schedule_id))
            })?;

        let existing = self
            .guide_assignments
            .iter()
            .find(|entry| {
                let link = entry.value();
                link.booking_id == anchor_booking
                    && link.guide_id == guide_id
                    && link.organization_id == organization_id
            })
            .map(|entry| entry.value().id);

        if let Some(id) = existing {
            return Ok(id);
        }

        let link = GuideAssignment {
            id: Uuid::new_v4(),
            organization_id,
            schedule_id,
            booking_id: anchor_booking,
            guide_id,
        };
        let id = link.id;
        self.guide_assignments.insert(id, link);
        self.writes.fetch_add(1, Ordering::SeqCst);

        debug!(%schedule_id, %guide_id, guide_assignment_id = %id, "guide assignment created");
        Ok(id)
    }

    async fn insert_pickup_assignments(
        &self,
        rows: Vec<NewPickupAssignment>,
    ) -> Result<Vec<PickupAssignment>, AppError> {
        let mut inserted = Vec::with_capacity(rows.len());

        for row in rows {
            let pickup = PickupAssignment {
                id: Uuid::new_v4(),
                schedule_id: row.schedule_id,
                guide_assignment_id: row.guide_assignment_id,
                guide_id: row.guide_id,
                booking_id: row.booking_id,
                pickup_address_id: row.pickup_address_id,
                pickup_order: row.pickup_order,
                passenger_count: row.passenger_count,
                status: row.status,
                estimated_pickup_time: None,
            };

            if let Some(mut booking) = self.bookings.get_mut(&row.booking_id) {
                booking.assigned = true;
            }
            self.pickups.insert(pickup.id, pickup.clone());
            inserted.push(pickup);
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(inserted)
    }

    async fn list_guide_pickups(
        &self,
        schedule_id: Uuid,
        guide_id: Uuid,
    ) -> Result<Vec<PickupAssignment>, AppError> {
        let mut pickups: Vec<PickupAssignment> = self
            .pickups
            .iter()
            .filter(|entry| {
                let pickup = entry.value();
                pickup.schedule_id == schedule_id && pickup.guide_id == guide_id
            })
            .map(|entry| entry.value().clone())
            .collect();

        // sequenced stops keep their order, fresh ones follow in insertion order
        pickups.sort_by_key(|pickup| {
            (
                pickup.estimated_pickup_time.is_none(),
                pickup.pickup_order,
                pickup.id,
            )
        });
        Ok(pickups)
    }

    async fn update_pickup_schedule(
        &self,
        pickup_id: Uuid,
        pickup_order: u32,
        estimated_pickup_time: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut pickup = self
            .pickups
            .get_mut(&pickup_id)
            .ok_or_else(|| AppError::NotFound(format!("pickup {} not found", pickup_id)))?;

        pickup.pickup_order = pickup_order;
        pickup.estimated_pickup_time = Some(estimated_pickup_time);
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}

#[async_trait]
impl AvailabilityRepository for MemoryStore {
    async fn get_tour(&self, tour_id: Uuid) -> Result<Tour, AppError> {
        self.tours
            .get(&tour_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("tour {} not found", tour_id)))
    }

    async fn list_booking_options(&self, tour_id: Uuid) -> Result<Vec<BookingOption>, AppError> {
        let mut options: Vec<BookingOption> = self
            .booking_options
            .iter()
            .filter(|entry| entry.value().tour_id == tour_id)
            .map(|entry| entry.value().clone())
            .collect();
        options.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(options)
    }

    async fn list_departures(
        &self,
        tour_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Departure>, AppError> {
        let mut departures: Vec<Departure> = self
            .schedules
            .iter()
            .filter(|entry| entry.value().tour_id == tour_id && entry.value().date == date)
            .map(|entry| Departure {
                schedule_id: entry.value().id,
                time: entry.value().departure_time(),
            })
            .collect();
        departures.sort_by_key(|departure| (departure.time, departure.schedule_id));
        Ok(departures)
    }

    async fn slot_usage(&self, schedule_id: Uuid, option_id: Uuid) -> Result<SlotUsage, AppError> {
        Ok(self
            .slot_usage
            .get(&(schedule_id, option_id))
            .map(|entry| *entry.value())
            .unwrap_or_default())
    }
}
