use tracing::debug;
use uuid::Uuid;

use crate::engine::scoring::suggestion_score;
use crate::error::AppError;
use crate::models::assignment::GuideSuggestion;
use crate::models::booking::UnassignedBooking;
use crate::models::guide::AvailableGuide;
use crate::store::AssignmentRepository;

/// Ranks every conflict-free guide with room for the booking, best first.
pub fn rank_guides(booking: &UnassignedBooking, guides: &[AvailableGuide]) -> Vec<GuideSuggestion> {
    let mut suggestions: Vec<GuideSuggestion> = guides
        .iter()
        .filter(|guide| !guide.has_conflict && guide.available_capacity >= booking.passenger_count)
        .map(|guide| {
            let scored = suggestion_score(guide, booking);
            GuideSuggestion {
                guide_id: guide.id,
                guide_name: guide.name.clone(),
                score: scored.score,
                reasons: scored.reasons,
                remaining_capacity: guide.available_capacity - booking.passenger_count,
            }
        })
        .collect();

    suggestions.sort_by(|a, b| b.score.cmp(&a.score));
    suggestions
}

pub async fn suggest_guides(
    repo: &dyn AssignmentRepository,
    schedule_id: Uuid,
    booking_id: Uuid,
) -> Result<Vec<GuideSuggestion>, AppError> {
    let snapshot = repo.get_tour_assignment_data(schedule_id).await?;

    let booking = snapshot
        .unassigned_bookings
        .iter()
        .find(|booking| booking.id == booking_id)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "unassigned booking {} not found on schedule {}",
                booking_id, schedule_id
            ))
        })?;

    let ranked = rank_guides(booking, &snapshot.available_guides);
    debug!(%schedule_id, %booking_id, candidates = ranked.len(), "guides ranked");

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use uuid::Uuid;

    use super::rank_guides;
    use crate::models::booking::UnassignedBooking;
    use crate::models::guide::AvailableGuide;

    fn guide(seed: u128, capacity: u32, load: u32, zones: &[&str], conflict: bool) -> AvailableGuide {
        AvailableGuide {
            id: Uuid::from_u128(seed),
            name: format!("guide-{seed}"),
            available_capacity: capacity.saturating_sub(load),
            vehicle_capacity: capacity,
            preferred_zones: zones.iter().map(|z| z.to_string()).collect::<HashSet<_>>(),
            current_load: load,
            has_conflict: conflict,
        }
    }

    fn booking(passengers: u32, zone: &str) -> UnassignedBooking {
        UnassignedBooking {
            id: Uuid::from_u128(900),
            passenger_count: passengers,
            is_private: false,
            zone: Some(zone.to_string()),
        }
    }

    #[test]
    fn ranks_by_score_and_skips_ineligible_guides() {
        let guides = vec![
            guide(1, 14, 4, &[], false),
            guide(2, 6, 0, &["downtown"], false),
            guide(3, 6, 0, &["downtown"], true),
            guide(4, 2, 0, &[], false),
        ];

        let ranked = rank_guides(&booking(3, "downtown"), &guides);

        let ids: Vec<u128> = ranked.iter().map(|s| s.guide_id.as_u128()).collect();
        assert_eq!(ids, vec![2, 1]);
        // 50 base + 25 zone + 10 idle; 3/6 is below the fill threshold
        assert_eq!(ranked[0].score, 85);
        assert_eq!(ranked[0].remaining_capacity, 3);
        assert_eq!(ranked[1].score, 50);
    }

    #[test]
    fn equal_scores_keep_roster_order() {
        let guides = vec![guide(7, 10, 1, &[], false), guide(3, 10, 1, &[], false)];
        let ranked = rank_guides(&booking(2, "strip"), &guides);
        assert_eq!(ranked[0].guide_id.as_u128(), 7);
        assert_eq!(ranked[1].guide_id.as_u128(), 3);
    }

    #[test]
    fn score_is_capped_at_one_hundred() {
        let guides = vec![guide(1, 4, 0, &["strip"], false)];
        let ranked = rank_guides(&booking(4, "strip"), &guides);
        assert_eq!(ranked[0].score, 100);
    }
}
