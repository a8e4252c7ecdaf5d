use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::capacity::CapacityLedger;
use crate::engine::routing::optimize_guide_route;
use crate::engine::scoring::packing_score;
use crate::error::AppError;
use crate::models::assignment::{
    AssignmentFlag, AssignmentStats, FlagKind, InternalAssignment, NewPickupAssignment,
    PickupAssignment, PickupStatus, TourAssignmentResult,
};
use crate::models::booking::UnassignedBooking;
use crate::models::guide::AvailableGuide;
use crate::models::schedule::ExistingGuideAssignment;
use crate::store::AssignmentRepository;

/// Cluster for shared bookings that carry no pickup zone.
pub const UNKNOWN_ZONE: &str = "unknown";

#[derive(Debug, Clone, Default)]
pub struct AssignmentPlan {
    pub assignments: Vec<InternalAssignment>,
    pub flags: Vec<AssignmentFlag>,
    pub ledger: CapacityLedger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuideLoad {
    pub passengers: u32,
    pub bookings: u32,
    pub vehicle_capacity: u32,
}

impl From<&ExistingGuideAssignment> for GuideLoad {
    fn from(link: &ExistingGuideAssignment) -> Self {
        Self {
            passengers: link.passenger_count,
            bookings: link.pickup_count,
            vehicle_capacity: link.vehicle_capacity,
        }
    }
}

impl AssignmentPlan {
    /// Per-guide totals in guide snapshot order.
    pub fn guide_loads(&self, guides: &[AvailableGuide]) -> Vec<GuideLoad> {
        guides
            .iter()
            .map(|guide| {
                let mine = self
                    .assignments
                    .iter()
                    .filter(|assignment| assignment.guide_id == guide.id);

                let (passengers, bookings) = mine.fold((0, 0), |(passengers, bookings), a| {
                    (passengers + a.passenger_count, bookings + 1)
                });

                GuideLoad {
                    passengers,
                    bookings,
                    vehicle_capacity: guide.vehicle_capacity,
                }
            })
            .collect()
    }
}

/// Places bookings on conflict-free guides without touching storage.
///
/// Private parties go first, each onto the first guide with enough seats, and
/// take the whole vehicle. Shared bookings are clustered by zone and packed
/// largest first onto the best scoring guide.
pub fn plan_assignments(bookings: &[UnassignedBooking], guides: &[AvailableGuide]) -> AssignmentPlan {
    let eligible: Vec<&AvailableGuide> = guides.iter().filter(|guide| !guide.has_conflict).collect();
    let mut ledger = CapacityLedger::new(&eligible);
    let mut assignments = Vec::new();
    let mut flags = Vec::new();

    let (private, shared): (Vec<&UnassignedBooking>, Vec<&UnassignedBooking>) =
        bookings.iter().partition(|booking| booking.is_private);

    for booking in private {
        let guide = eligible
            .iter()
            .find(|guide| ledger.can_take(guide.id, booking.passenger_count));

        match guide {
            Some(guide) => {
                ledger.claim_vehicle(guide.id);
                assignments.push(InternalAssignment {
                    booking_id: booking.id,
                    guide_id: guide.id,
                    passenger_count: booking.passenger_count,
                    zone: booking.zone.clone(),
                    is_private: true,
                });
            }
            None => flags.push(AssignmentFlag {
                booking_id: booking.id,
                kind: FlagKind::NoCapacity,
                message: format!(
                    "No vehicle free for private booking of {} passengers",
                    booking.passenger_count
                ),
                suggestion: Some("Add a guide or free up a vehicle for this departure".to_string()),
            }),
        }
    }

    for (zone, mut cluster) in cluster_by_zone(&shared) {
        cluster.sort_by(|a, b| b.passenger_count.cmp(&a.passenger_count));

        for booking in cluster {
            match best_guide(&eligible, &ledger, &zone, booking.passenger_count) {
                Some(guide_id) => {
                    ledger.consume(guide_id, booking.passenger_count);
                    assignments.push(InternalAssignment {
                        booking_id: booking.id,
                        guide_id,
                        passenger_count: booking.passenger_count,
                        zone: booking.zone.clone(),
                        is_private: false,
                    });
                }
                None => flags.push(AssignmentFlag {
                    booking_id: booking.id,
                    kind: FlagKind::NoCapacity,
                    message: format!(
                        "No guide has {} free seats for the {zone} zone",
                        booking.passenger_count
                    ),
                    suggestion: Some(
                        "Add a guide or move the booking to another departure".to_string(),
                    ),
                }),
            }
        }
    }

    AssignmentPlan {
        assignments,
        flags,
        ledger,
    }
}

/// Groups by zone, keeping zones in order of first appearance.
fn cluster_by_zone<'a>(
    bookings: &[&'a UnassignedBooking],
) -> Vec<(String, Vec<&'a UnassignedBooking>)> {
    let mut clusters: Vec<(String, Vec<&'a UnassignedBooking>)> = Vec::new();

    for &booking in bookings {
        let zone = booking
            .zone
            .as_deref()
            .filter(|zone| !zone.trim().is_empty())
            .unwrap_or(UNKNOWN_ZONE);

        match clusters.iter_mut().find(|(name, _)| name == zone) {
            Some((_, members)) => members.push(booking),
            None => clusters.push((zone.to_string(), vec![booking])),
        }
    }

    clusters
}

fn best_guide(
    eligible: &[&AvailableGuide],
    ledger: &CapacityLedger,
    zone: &str,
    passengers: u32,
) -> Option<Uuid> {
    let mut best: Option<(Uuid, u32)> = None;

    for guide in eligible {
        let remaining = ledger.remaining(guide.id);
        if remaining < passengers {
            continue;
        }

        let score = packing_score(guide, zone, remaining);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((guide.id, score));
        }
    }

    best.map(|(guide_id, _)| guide_id)
}

pub fn compute_stats(loads: &[GuideLoad]) -> AssignmentStats {
    let used: Vec<&GuideLoad> = loads.iter().filter(|load| load.bookings > 0).collect();
    if used.is_empty() {
        return AssignmentStats::default();
    }

    let passengers: u32 = used.iter().map(|load| load.passengers).sum();
    let seats: u32 = used.iter().map(|load| load.vehicle_capacity).sum();
    let vehicle_utilization = if seats == 0 {
        0.0
    } else {
        f64::from(passengers) / f64::from(seats)
    };

    AssignmentStats {
        vehicle_utilization,
        guide_balance: balance(&used),
        guides_used: used.len(),
        passengers_assigned: passengers,
    }
}

fn balance(used: &[&GuideLoad]) -> f64 {
    if used.len() <= 1 {
        return 1.0;
    }

    let n = used.len() as f64;
    let mean = used.iter().map(|load| f64::from(load.bookings)).sum::<f64>() / n;
    let variance = used
        .iter()
        .map(|load| (f64::from(load.bookings) - mean).powi(2))
        .sum::<f64>()
        / n;
    let coefficient_of_variation = variance.sqrt() / mean;

    (1.0 - coefficient_of_variation).max(0.0)
}

fn no_qualified_guide(booking: &UnassignedBooking) -> AssignmentFlag {
    AssignmentFlag {
        booking_id: booking.id,
        kind: FlagKind::NoQualifiedGuide,
        message: "No guide without a scheduling conflict is available".to_string(),
        suggestion: Some("Roster an additional guide for this departure".to_string()),
    }
}

/// Assigns every unassigned booking of one departure and sequences the pickups.
///
/// Callers must not run this concurrently for the same departure.
pub async fn auto_assign_tour(
    repo: &dyn AssignmentRepository,
    schedule_id: Uuid,
) -> Result<TourAssignmentResult, AppError> {
    let started = Instant::now();
    let snapshot = repo.get_tour_assignment_data(schedule_id).await?;
    let schedule = &snapshot.schedule;

    if snapshot.unassigned_bookings.is_empty() {
        let loads: Vec<GuideLoad> = snapshot
            .existing_guide_assignments
            .iter()
            .map(GuideLoad::from)
            .collect();

        info!(%schedule_id, "no unassigned bookings");
        return Ok(TourAssignmentResult {
            success: true,
            schedule_id,
            assigned: 0,
            unassigned: 0,
            flags: Vec::new(),
            stats: compute_stats(&loads),
        });
    }

    if snapshot.available_guides.iter().all(|guide| guide.has_conflict) {
        let flags: Vec<AssignmentFlag> = snapshot
            .unassigned_bookings
            .iter()
            .map(no_qualified_guide)
            .collect();

        warn!(
            %schedule_id,
            bookings = flags.len(),
            "no conflict-free guides for departure"
        );
        return Ok(TourAssignmentResult {
            success: false,
            schedule_id,
            assigned: 0,
            unassigned: flags.len(),
            flags,
            stats: AssignmentStats::default(),
        });
    }

    let plan = plan_assignments(&snapshot.unassigned_bookings, &snapshot.available_guides);
    for flag in &plan.flags {
        warn!(
            %schedule_id,
            booking_id = %flag.booking_id,
            flag = flag.kind.as_str(),
            "booking left unassigned"
        );
    }

    let mut links: HashMap<Uuid, Uuid> = snapshot
        .existing_guide_assignments
        .iter()
        .map(|link| (link.guide_id, link.id))
        .collect();

    let mut rows = Vec::with_capacity(plan.assignments.len());
    for (index, assignment) in plan.assignments.iter().enumerate() {
        let guide_assignment_id = match links.get(&assignment.guide_id) {
            Some(id) => *id,
            None => {
                let id = repo
                    .find_or_create_guide_assignment(
                        schedule.organization_id,
                        schedule.id,
                        assignment.guide_id,
                    )
                    .await?;
                links.insert(assignment.guide_id, id);
                id
            }
        };

        let booking = repo.get_booking(assignment.booking_id).await?;

        rows.push(NewPickupAssignment {
            schedule_id: schedule.id,
            guide_assignment_id,
            guide_id: assignment.guide_id,
            booking_id: assignment.booking_id,
            pickup_address_id: booking.pickup_address_id,
            pickup_order: index as u32 + 1,
            passenger_count: assignment.passenger_count,
            status: PickupStatus::Pending,
        });
    }

    let inserted = if rows.is_empty() {
        Vec::new()
    } else {
        repo.insert_pickup_assignments(rows).await?
    };

    let departure = schedule.departure;
    try_join_all(
        guides_touched(&inserted)
            .into_iter()
            .map(|guide_id| resequence_guide(repo, schedule.id, guide_id, departure)),
    )
    .await?;

    let stats = compute_stats(&plan.guide_loads(&snapshot.available_guides));
    let result = TourAssignmentResult {
        success: plan.flags.is_empty(),
        schedule_id,
        assigned: plan.assignments.len(),
        unassigned: plan.flags.len(),
        flags: plan.flags,
        stats,
    };

    info!(
        %schedule_id,
        assigned = result.assigned,
        unassigned = result.unassigned,
        utilization = result.stats.vehicle_utilization,
        balance = result.stats.guide_balance,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tour assignment finished"
    );

    Ok(result)
}

/// Guides that received a pickup, in first-appearance order.
fn guides_touched(pickups: &[PickupAssignment]) -> Vec<Uuid> {
    let mut guides: Vec<Uuid> = Vec::new();
    for pickup in pickups {
        if !guides.contains(&pickup.guide_id) {
            guides.push(pickup.guide_id);
        }
    }
    guides
}

/// Routes the guide's whole stop list on the departure, earlier runs included.
async fn resequence_guide(
    repo: &dyn AssignmentRepository,
    schedule_id: Uuid,
    guide_id: Uuid,
    departure: DateTime<Utc>,
) -> Result<(), AppError> {
    let pickups = repo.list_guide_pickups(schedule_id, guide_id).await?;
    optimize_guide_route(repo, pickups, departure).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use super::{auto_assign_tour, compute_stats, plan_assignments, GuideLoad};
    use crate::geo::GeoPoint;
    use crate::models::assignment::FlagKind;
    use crate::models::booking::{BookingRecord, PickupAddress, UnassignedBooking};
    use crate::models::guide::AvailableGuide;
    use crate::models::schedule::TourSchedule;
    use crate::store::memory::{GuideProfile, RosterEntry};
    use crate::store::MemoryStore;

    fn guide(seed: u128, capacity: u32, zones: &[&str]) -> AvailableGuide {
        AvailableGuide {
            id: Uuid::from_u128(seed),
            name: format!("guide-{seed}"),
            available_capacity: capacity,
            vehicle_capacity: capacity,
            preferred_zones: zones.iter().map(|z| z.to_string()).collect::<HashSet<_>>(),
            current_load: 0,
            has_conflict: false,
        }
    }

    fn shared(seed: u128, passengers: u32, zone: Option<&str>) -> UnassignedBooking {
        UnassignedBooking {
            id: Uuid::from_u128(seed),
            passenger_count: passengers,
            is_private: false,
            zone: zone.map(str::to_string),
        }
    }

    fn private(seed: u128, passengers: u32) -> UnassignedBooking {
        UnassignedBooking {
            is_private: true,
            ..shared(seed, passengers, None)
        }
    }

    fn guide_of(plan: &super::AssignmentPlan, booking_seed: u128) -> Option<u128> {
        plan.assignments
            .iter()
            .find(|a| a.booking_id == Uuid::from_u128(booking_seed))
            .map(|a| a.guide_id.as_u128())
    }

    #[test]
    fn ffd_places_largest_booking_on_roomiest_guide() {
        let guides = vec![guide(1, 4, &[]), guide(2, 6, &[])];
        let bookings = vec![
            shared(10, 2, Some("strip")),
            shared(11, 3, Some("strip")),
            shared(12, 2, Some("strip")),
        ];

        let plan = plan_assignments(&bookings, &guides);

        assert!(plan.flags.is_empty());
        assert_eq!(guide_of(&plan, 11), Some(2));
        // both remaining 2-seat bookings score 60 on each guide; ties go to snapshot order
        assert_eq!(guide_of(&plan, 10), Some(1));
        assert_eq!(guide_of(&plan, 12), Some(2));

        let stats = compute_stats(&plan.guide_loads(&guides));
        assert!((stats.vehicle_utilization - 0.7).abs() < 1e-9);
        assert_eq!(stats.passengers_assigned, 7);
    }

    #[test]
    fn private_booking_takes_first_fitting_guide_and_whole_vehicle() {
        let guides = vec![guide(1, 4, &[]), guide(2, 6, &[])];
        let plan = plan_assignments(&[private(10, 2)], &guides);

        assert_eq!(guide_of(&plan, 10), Some(1));
        assert_eq!(plan.ledger.remaining(Uuid::from_u128(1)), 0);
        assert_eq!(plan.ledger.remaining(Uuid::from_u128(2)), 6);
    }

    #[test]
    fn private_bookings_always_leave_zero_seats() {
        for capacity in 1..=10u32 {
            for passengers in 1..=capacity {
                let guides = vec![guide(1, capacity, &[])];
                let plan = plan_assignments(&[private(10, passengers)], &guides);
                assert_eq!(plan.ledger.remaining(Uuid::from_u128(1)), 0);
            }
        }
    }

    #[test]
    fn second_private_party_cannot_share_a_vehicle() {
        let guides = vec![guide(1, 8, &[])];
        let plan = plan_assignments(&[private(10, 2), private(11, 2)], &guides);

        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.flags.len(), 1);
        assert_eq!(plan.flags[0].kind, FlagKind::NoCapacity);
        assert_eq!(plan.flags[0].booking_id, Uuid::from_u128(11));
        assert!(plan.flags[0].suggestion.is_some());
    }

    #[test]
    fn zone_preference_pulls_booking_to_local_guide() {
        let guides = vec![guide(1, 6, &[]), guide(2, 6, &["henderson"])];
        let plan = plan_assignments(&[shared(10, 2, Some("henderson"))], &guides);
        assert_eq!(guide_of(&plan, 10), Some(2));
    }

    #[test]
    fn conflicted_guides_are_never_used() {
        let mut busy = guide(1, 10, &["strip"]);
        busy.has_conflict = true;
        let guides = vec![busy, guide(2, 3, &[])];

        let plan = plan_assignments(&[shared(10, 3, Some("strip")), shared(11, 1, None)], &guides);

        assert_eq!(guide_of(&plan, 10), Some(2));
        assert_eq!(plan.flags.len(), 1);
        assert_eq!(plan.flags[0].booking_id, Uuid::from_u128(11));
    }

    #[test]
    fn bookings_without_zone_form_their_own_cluster() {
        let guides = vec![guide(1, 4, &[])];
        let bookings = vec![shared(10, 1, None), shared(11, 4, Some("strip"))];

        let plan = plan_assignments(&bookings, &guides);

        // the unknown cluster appears first and is packed first
        assert_eq!(guide_of(&plan, 10), Some(1));
        assert_eq!(plan.flags[0].booking_id, Uuid::from_u128(11));
        assert!(plan.flags[0].message.contains("strip"));
    }

    #[test]
    fn every_booking_is_assigned_or_flagged_and_no_vehicle_overflows() {
        let sizes = [5u32, 1, 3, 2, 4, 2, 6, 1, 3];
        for guide_count in 1..=3u128 {
            let guides: Vec<AvailableGuide> = (0..guide_count)
                .map(|i| guide(i + 1, 3 + (i as u32) * 2, if i == 0 { &["a"] } else { &[] }))
                .collect();
            let bookings: Vec<UnassignedBooking> = sizes
                .iter()
                .enumerate()
                .map(|(i, &size)| {
                    let zone = if i % 2 == 0 { Some("a") } else { Some("b") };
                    if i % 4 == 3 {
                        private(100 + i as u128, size)
                    } else {
                        shared(100 + i as u128, size, zone)
                    }
                })
                .collect();

            let plan = plan_assignments(&bookings, &guides);

            for booking in &bookings {
                let assigned = plan.assignments.iter().filter(|a| a.booking_id == booking.id).count();
                let flagged = plan.flags.iter().filter(|f| f.booking_id == booking.id).count();
                assert_eq!(assigned + flagged, 1, "booking {} placed {assigned}+{flagged} times", booking.id);
            }

            let mut per_guide: HashMap<Uuid, u32> = HashMap::new();
            for assignment in &plan.assignments {
                *per_guide.entry(assignment.guide_id).or_default() += assignment.passenger_count;
            }
            for guide in &guides {
                assert!(per_guide.get(&guide.id).copied().unwrap_or(0) <= guide.vehicle_capacity);
            }
        }
    }

    #[test]
    fn balance_is_perfect_for_one_guide_and_drops_with_skew() {
        let one = [GuideLoad { passengers: 3, bookings: 2, vehicle_capacity: 6 }];
        assert_eq!(compute_stats(&one).guide_balance, 1.0);

        let even = [
            GuideLoad { passengers: 3, bookings: 2, vehicle_capacity: 6 },
            GuideLoad { passengers: 4, bookings: 2, vehicle_capacity: 6 },
        ];
        assert!((compute_stats(&even).guide_balance - 1.0).abs() < 1e-9);

        // counts 1 and 3: mean 2, sd 1, cv 0.5
        let skewed = [
            GuideLoad { passengers: 1, bookings: 1, vehicle_capacity: 6 },
            GuideLoad { passengers: 5, bookings: 3, vehicle_capacity: 6 },
            GuideLoad { passengers: 0, bookings: 0, vehicle_capacity: 10 },
        ];
        let stats = compute_stats(&skewed);
        assert!((stats.guide_balance - 0.5).abs() < 1e-9);
        assert!((stats.vehicle_utilization - 0.5).abs() < 1e-9);
        assert_eq!(stats.guides_used, 2);
    }

    // repository-backed runs

    fn seeded_store(bookings: &[(u128, u32, bool, Option<&str>)], guides: &[(u128, u32, bool)]) -> (MemoryStore, TourSchedule) {
        let store = MemoryStore::new();
        let schedule = TourSchedule {
            id: Uuid::from_u128(500),
            organization_id: Uuid::from_u128(1),
            tour_id: Uuid::from_u128(2),
            date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            departure: Utc.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap(),
        };
        store.insert_schedule(schedule.clone());

        for &(seed, passengers, is_private, zone) in bookings {
            let address_id = Uuid::from_u128(seed + 10_000);
            store.insert_address(PickupAddress {
                id: address_id,
                name: format!("hotel-{seed}"),
                location: Some(GeoPoint::new(36.1 + seed as f64 * 0.001, -115.17)),
                average_pickup_minutes: None,
            });
            store.insert_booking(BookingRecord {
                id: Uuid::from_u128(seed),
                schedule_id: schedule.id,
                passenger_count: passengers,
                is_private,
                zone: zone.map(str::to_string),
                pickup_address_id: Some(address_id),
                assigned: false,
            });
        }

        let mut roster = Vec::new();
        for &(seed, capacity, has_conflict) in guides {
            store.insert_guide(GuideProfile {
                id: Uuid::from_u128(seed),
                name: format!("guide-{seed}"),
                vehicle_capacity: capacity,
                preferred_zones: HashSet::new(),
            });
            roster.push(RosterEntry {
                guide_id: Uuid::from_u128(seed),
                has_conflict,
            });
        }
        store.set_roster(schedule.id, roster);

        (store, schedule)
    }

    #[tokio::test]
    async fn tour_run_persists_and_sequences_pickups() {
        let (store, schedule) = seeded_store(
            &[(10, 3, false, Some("strip")), (11, 2, false, Some("strip")), (12, 2, false, Some("strip"))],
            &[(1, 4, false), (2, 6, false)],
        );

        let result = auto_assign_tour(&store, schedule.id).await.unwrap();

        assert!(result.success);
        assert_eq!(result.assigned, 3);
        assert_eq!(result.unassigned, 0);
        assert!((result.stats.vehicle_utilization - 0.7).abs() < 1e-9);

        let pickups = store.pickups_for_schedule(schedule.id);
        assert_eq!(pickups.len(), 3);
        assert!(pickups.iter().all(|p| p.estimated_pickup_time.is_some()));
        assert!(pickups.iter().all(|p| p.pickup_address_id.is_some()));

        let van: Vec<_> = pickups.iter().filter(|p| p.guide_id == Uuid::from_u128(2)).collect();
        let orders: Vec<u32> = van.iter().map(|p| p.pickup_order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(van[0].guide_assignment_id, van[1].guide_assignment_id);
    }

    #[tokio::test]
    async fn rerun_with_nothing_left_reports_existing_utilization() {
        let (store, schedule) = seeded_store(
            &[(10, 3, false, Some("strip")), (11, 2, false, Some("strip")), (12, 2, false, Some("strip"))],
            &[(1, 4, false), (2, 6, false)],
        );
        auto_assign_tour(&store, schedule.id).await.unwrap();
        let writes = store.write_count();

        let rerun = auto_assign_tour(&store, schedule.id).await.unwrap();

        assert!(rerun.success);
        assert_eq!(rerun.assigned, 0);
        assert_eq!(rerun.unassigned, 0);
        assert!((rerun.stats.vehicle_utilization - 0.7).abs() < 1e-9);
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn empty_tour_succeeds_without_touching_guides() {
        let (store, schedule) = seeded_store(&[], &[(1, 4, false)]);

        let result = auto_assign_tour(&store, schedule.id).await.unwrap();

        assert!(result.success);
        assert_eq!(result.assigned, 0);
        assert_eq!(result.unassigned, 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn all_guides_conflicted_flags_everything_without_writes() {
        let (store, schedule) = seeded_store(
            &[(10, 2, false, Some("strip")), (11, 4, true, None)],
            &[(1, 6, true), (2, 6, true)],
        );

        let result = auto_assign_tour(&store, schedule.id).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.assigned, 0);
        assert_eq!(result.unassigned, 2);
        assert!(result.flags.iter().all(|f| f.kind == FlagKind::NoQualifiedGuide));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn partial_run_keeps_assignments_and_reports_failure() {
        let (store, schedule) = seeded_store(
            &[(10, 4, true, None), (11, 3, false, Some("strip"))],
            &[(1, 4, false)],
        );

        let result = auto_assign_tour(&store, schedule.id).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.assigned, 1);
        assert_eq!(result.unassigned, 1);
        assert_eq!(store.pickups_for_schedule(schedule.id).len(), 1);
    }

    fn add_late_booking(store: &MemoryStore, schedule: &TourSchedule, seed: u128, passengers: u32) {
        let address_id = Uuid::from_u128(seed + 10_000);
        store.insert_address(PickupAddress {
            id: address_id,
            name: format!("hotel-{seed}"),
            location: Some(GeoPoint::new(36.2, -115.1)),
            average_pickup_minutes: None,
        });
        store.insert_booking(BookingRecord {
            id: Uuid::from_u128(seed),
            schedule_id: schedule.id,
            passenger_count: passengers,
            is_private: false,
            zone: Some("strip".to_string()),
            pickup_address_id: Some(address_id),
            assigned: false,
        });
    }

    #[tokio::test]
    async fn rerun_resequences_the_whole_route_of_a_guide() {
        let (store, schedule) = seeded_store(&[(10, 2, false, Some("strip"))], &[(1, 6, false)]);
        auto_assign_tour(&store, schedule.id).await.unwrap();

        add_late_booking(&store, &schedule, 11, 2);
        let rerun = auto_assign_tour(&store, schedule.id).await.unwrap();
        assert_eq!(rerun.assigned, 1);

        let pickups = store.pickups_for_schedule(schedule.id);
        let orders: Vec<u32> = pickups.iter().map(|p| p.pickup_order).collect();
        assert_eq!(orders, vec![1, 2]);

        // the earlier stop stays first and is now picked up before the late one
        assert_eq!(pickups[0].booking_id, Uuid::from_u128(10));
        assert_eq!(pickups[1].booking_id, Uuid::from_u128(11));
        let first = pickups[0].estimated_pickup_time.unwrap();
        let last = pickups[1].estimated_pickup_time.unwrap();
        assert!(first < last);
        assert_eq!(last, schedule.departure - chrono::Duration::minutes(5));
    }

    #[tokio::test]
    async fn rerun_keeps_private_vehicle_closed_to_shared_bookings() {
        let (store, schedule) = seeded_store(&[(10, 2, true, None)], &[(1, 6, false)]);
        let first = auto_assign_tour(&store, schedule.id).await.unwrap();
        assert_eq!(first.assigned, 1);

        add_late_booking(&store, &schedule, 11, 2);
        let rerun = auto_assign_tour(&store, schedule.id).await.unwrap();

        assert!(!rerun.success);
        assert_eq!(rerun.assigned, 0);
        assert_eq!(rerun.flags.len(), 1);
        assert_eq!(rerun.flags[0].booking_id, Uuid::from_u128(11));
        assert_eq!(rerun.flags[0].kind, FlagKind::NoCapacity);
        assert_eq!(store.pickups_for_schedule(schedule.id).len(), 1);
    }
}
