use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::assignment::auto_assign_tour;
use crate::engine::day::auto_assign_day;
use crate::error::AppError;
use crate::models::assignment::{DayAssignmentResult, TourAssignmentResult};
use crate::state::AppState;

pub enum AssignmentJob {
    Tour {
        schedule_id: Uuid,
        reply: oneshot::Sender<Result<TourAssignmentResult, AppError>>,
    },
    Day {
        date: NaiveDate,
        reply: oneshot::Sender<Result<DayAssignmentResult, AppError>>,
    },
}

/// Drains assignment jobs one at a time so no two runs read guide capacity concurrently.
pub async fn run_assignment_worker(state: Arc<AppState>, mut job_rx: mpsc::Receiver<AssignmentJob>) {
    info!("assignment worker started");

    while let Some(job) = job_rx.recv().await {
        state.metrics.jobs_in_queue.dec();

        match job {
            AssignmentJob::Tour { schedule_id, reply } => {
                let result = run_tour(&state, schedule_id).await;
                if reply.send(result).is_err() {
                    warn!(%schedule_id, "caller went away before tour result was ready");
                }
            }
            AssignmentJob::Day { date, reply } => {
                let result = run_day(&state, date).await;
                if reply.send(result).is_err() {
                    warn!(%date, "caller went away before day result was ready");
                }
            }
        }
    }

    warn!("assignment worker stopped: job channel closed");
}

async fn run_tour(state: &AppState, schedule_id: Uuid) -> Result<TourAssignmentResult, AppError> {
    let start = Instant::now();
    let outcome = auto_assign_tour(state.assignments.as_ref(), schedule_id).await;
    let elapsed = start.elapsed().as_secs_f64();

    match &outcome {
        Ok(result) => {
            state.metrics.record_tour(result, elapsed);
            let _ = state.result_events_tx.send(result.clone());
        }
        Err(err) => {
            state.metrics.record_failure("tour", elapsed);
            error!(%schedule_id, error = %err, "tour assignment failed");
        }
    }

    outcome
}

async fn run_day(state: &AppState, date: NaiveDate) -> Result<DayAssignmentResult, AppError> {
    let start = Instant::now();
    let outcome = auto_assign_day(state.assignments.as_ref(), date).await;
    let elapsed = start.elapsed().as_secs_f64();

    match &outcome {
        Ok(result) => {
            state.metrics.record_day(result, elapsed);
            for tour in result.tours.iter().filter_map(|tour| tour.result.as_ref()) {
                let _ = state.result_events_tx.send(tour.clone());
            }
        }
        Err(err) => {
            state.metrics.record_failure("day", elapsed);
            error!(%date, error = %err, "day assignment failed");
        }
    }

    outcome
}

pub async fn enqueue_job(state: &AppState, job: AssignmentJob) -> Result<(), AppError> {
    state
        .job_tx
        .send(job)
        .await
        .map_err(|err| AppError::Internal(format!("job queue send failed: {err}")))?;

    state.metrics.jobs_in_queue.inc();
    Ok(())
}

pub async fn submit_tour(
    state: &AppState,
    schedule_id: Uuid,
) -> Result<TourAssignmentResult, AppError> {
    let (reply, response) = oneshot::channel();
    enqueue_job(state, AssignmentJob::Tour { schedule_id, reply }).await?;

    response
        .await
        .map_err(|err| AppError::Internal(format!("assignment worker dropped job: {err}")))?
}

pub async fn submit_day(state: &AppState, date: NaiveDate) -> Result<DayAssignmentResult, AppError> {
    let (reply, response) = oneshot::channel();
    enqueue_job(state, AssignmentJob::Day { date, reply }).await?;

    response
        .await
        .map_err(|err| AppError::Internal(format!("assignment worker dropped job: {err}")))?
}
