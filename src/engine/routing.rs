//! Pickup sequencing for a single guide.
//!
//! Stops are ordered with a nearest-neighbour walk anchored on the first stop
//! as given, then pickup times are worked backwards from the departure.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::{distance_km, drive_minutes, GeoPoint};
use crate::models::assignment::PickupAssignment;
use crate::models::booking::{PickupAddress, DEFAULT_PICKUP_MINUTES};
use crate::store::AssignmentRepository;

/// Minutes between the last pickup and the departure.
pub const BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupStop {
    pub pickup_id: Uuid,
    pub booking_id: Uuid,
    pub address: Option<PickupAddress>,
}

impl PickupStop {
    fn location(&self) -> Option<&GeoPoint> {
        self.address.as_ref().and_then(|address| address.location.as_ref())
    }

    fn pickup_minutes(&self) -> i64 {
        let minutes = self
            .address
            .as_ref()
            .map(PickupAddress::pickup_minutes)
            .unwrap_or(DEFAULT_PICKUP_MINUTES);
        i64::from(minutes)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedStop {
    pub stop: PickupStop,
    pub pickup_order: u32,
    pub estimated_pickup_time: DateTime<Utc>,
}

pub fn optimize_route(stops: Vec<PickupStop>, departure: DateTime<Utc>) -> Vec<RoutedStop> {
    match stops.len() {
        0 => Vec::new(),
        1 => stops
            .into_iter()
            .map(|stop| {
                let estimated_pickup_time = departure - Duration::minutes(stop.pickup_minutes());
                RoutedStop {
                    stop,
                    pickup_order: 1,
                    estimated_pickup_time,
                }
            })
            .collect(),
        _ => {
            let ordered = nearest_neighbor(stops);
            let times = pickup_times(&ordered, departure);

            ordered
                .into_iter()
                .zip(times)
                .enumerate()
                .map(|(index, (stop, estimated_pickup_time))| RoutedStop {
                    stop,
                    pickup_order: index as u32 + 1,
                    estimated_pickup_time,
                })
                .collect()
        }
    }
}

fn nearest_neighbor(mut remaining: Vec<PickupStop>) -> Vec<PickupStop> {
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = remaining.remove(0);

    while !remaining.is_empty() {
        let mut nearest = 0;
        let mut nearest_km = f64::INFINITY;

        for (index, candidate) in remaining.iter().enumerate() {
            let km = distance_km(current.location(), candidate.location());
            if km < nearest_km {
                nearest = index;
                nearest_km = km;
            }
        }

        let next = remaining.remove(nearest);
        ordered.push(std::mem::replace(&mut current, next));
    }

    ordered.push(current);
    ordered
}

/// Walks backwards from the last stop, which is reached `BUFFER_MINUTES` before departure.
fn pickup_times(ordered: &[PickupStop], departure: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut times = vec![departure - Duration::minutes(BUFFER_MINUTES); ordered.len()];

    for index in (0..ordered.len().saturating_sub(1)).rev() {
        let next = &ordered[index + 1];
        let leg = drive_minutes(ordered[index].location(), next.location());
        times[index] = times[index + 1] - Duration::minutes(leg + next.pickup_minutes());
    }

    times
}

/// Sequences one guide's persisted pickups and writes order and ETA back.
pub async fn optimize_guide_route(
    repo: &dyn AssignmentRepository,
    pickups: Vec<PickupAssignment>,
    departure: DateTime<Utc>,
) -> Result<Vec<RoutedStop>, AppError> {
    let mut stops = Vec::with_capacity(pickups.len());
    for pickup in pickups {
        let address = match pickup.pickup_address_id {
            Some(address_id) => repo.get_pickup_address(address_id).await?,
            None => None,
        };

        stops.push(PickupStop {
            pickup_id: pickup.id,
            booking_id: pickup.booking_id,
            address,
        });
    }

    let routed = optimize_route(stops, departure);

    for routed_stop in &routed {
        repo.update_pickup_schedule(
            routed_stop.stop.pickup_id,
            routed_stop.pickup_order,
            routed_stop.estimated_pickup_time,
        )
        .await?;

        debug!(
            booking_id = %routed_stop.stop.booking_id,
            pickup_order = routed_stop.pickup_order,
            eta = %routed_stop.estimated_pickup_time,
            "pickup sequenced"
        );
    }

    Ok(routed)
}
