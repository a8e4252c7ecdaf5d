use chrono::NaiveDate;
use tracing::{error, info};

use crate::engine::assignment::auto_assign_tour;
use crate::error::AppError;
use crate::models::assignment::{DayAssignmentResult, DayTourOutcome};
use crate::store::AssignmentRepository;

/// Runs the tour engine for every departure of a day, one after another.
///
/// Departures share one guide pool, so runs are never overlapped. Each tour
/// commits on its own; a failing tour is reported and the day carries on.
pub async fn auto_assign_day(
    repo: &dyn AssignmentRepository,
    date: NaiveDate,
) -> Result<DayAssignmentResult, AppError> {
    let overview = repo.get_day_overview(date).await?;
    let mut tours = Vec::with_capacity(overview.tours.len());

    for tour in &overview.tours {
        let outcome = match auto_assign_tour(repo, tour.schedule_id).await {
            Ok(result) => DayTourOutcome {
                schedule_id: tour.schedule_id,
                result: Some(result),
                error: None,
            },
            Err(err) => {
                error!(schedule_id = %tour.schedule_id, error = %err, "tour assignment failed");
                DayTourOutcome {
                    schedule_id: tour.schedule_id,
                    result: None,
                    error: Some(err.to_string()),
                }
            }
        };
        tours.push(outcome);
    }

    let fully_assigned = tours.iter().filter(|tour| tour.fully_assigned()).count();
    let (total_assigned, total_unassigned) = tours
        .iter()
        .filter_map(|tour| tour.result.as_ref())
        .fold((0, 0), |(assigned, unassigned), result| {
            (assigned + result.assigned, unassigned + result.unassigned)
        });

    let result = DayAssignmentResult {
        date,
        total_tours: tours.len(),
        fully_assigned,
        needs_attention: tours.len() - fully_assigned,
        total_assigned,
        total_unassigned,
        tours,
    };

    info!(
        %date,
        tours = result.total_tours,
        fully_assigned = result.fully_assigned,
        needs_attention = result.needs_attention,
        "day assignment finished"
    );

    Ok(result)
}
