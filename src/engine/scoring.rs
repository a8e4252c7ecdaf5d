use crate::models::booking::UnassignedBooking;
use crate::models::guide::AvailableGuide;

const ZONE_MATCH_WEIGHT: u32 = 20;
const REMAINING_SEAT_WEIGHT: u32 = 10;
const ORIGINAL_SEAT_WEIGHT: u32 = 5;

const SUGGESTION_BASE: u32 = 50;
const SUGGESTION_ZONE_BONUS: u32 = 25;
const SUGGESTION_FILL_BONUS: u32 = 15;
const SUGGESTION_IDLE_BONUS: u32 = 10;
const SUGGESTION_MAX: u32 = 100;
const WELL_FILLED_RATIO: f64 = 0.8;

/// Score used while bin-packing shared bookings into vehicles.
pub fn packing_score(guide: &AvailableGuide, zone: &str, remaining: u32) -> u32 {
    let zone_match = if guide.prefers(zone) {
        ZONE_MATCH_WEIGHT
    } else {
        0
    };

    zone_match
        .saturating_add(remaining.saturating_mul(REMAINING_SEAT_WEIGHT))
        .saturating_add(guide.available_capacity.saturating_mul(ORIGINAL_SEAT_WEIGHT))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionScore {
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Advisory score shown when a dispatcher assigns a booking by hand.
///
/// Weighs different signals than `packing_score`; the two are kept apart.
pub fn suggestion_score(guide: &AvailableGuide, booking: &UnassignedBooking) -> SuggestionScore {
    let mut score = SUGGESTION_BASE;
    let mut reasons = vec![format!("Has room for {} passengers", booking.passenger_count)];

    if let Some(zone) = booking.zone.as_deref().filter(|zone| guide.prefers(zone)) {
        score += SUGGESTION_ZONE_BONUS;
        reasons.push(format!("Prefers the {zone} pickup zone"));
    }

    let utilization = fill_ratio(guide, booking.passenger_count);
    if utilization >= WELL_FILLED_RATIO {
        score += SUGGESTION_FILL_BONUS;
        reasons.push(format!(
            "Fills the vehicle to {:.0}%",
            (utilization * 100.0).min(100.0)
        ));
    }

    if guide.current_load == 0 {
        score += SUGGESTION_IDLE_BONUS;
        reasons.push("No passengers yet today".to_string());
    }

    SuggestionScore {
        score: score.min(SUGGESTION_MAX),
        reasons,
    }
}

fn fill_ratio(guide: &AvailableGuide, passengers: u32) -> f64 {
    if guide.vehicle_capacity == 0 {
        return 0.0;
    }

    f64::from(guide.current_load.saturating_add(passengers)) / f64::from(guide.vehicle_capacity)
}
