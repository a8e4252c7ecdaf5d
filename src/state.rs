use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::engine::queue::AssignmentJob;
use crate::models::assignment::TourAssignmentResult;
use crate::observability::metrics::Metrics;
use crate::store::{AssignmentRepository, AvailabilityRepository, MemoryStore};

pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub job_tx: mpsc::Sender<AssignmentJob>,
    pub result_events_tx: broadcast::Sender<TourAssignmentResult>,
    pub alternative_date_window: u32,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<MemoryStore>,
        job_queue_size: usize,
        event_buffer_size: usize,
        alternative_date_window: u32,
    ) -> (Self, mpsc::Receiver<AssignmentJob>) {
        let (job_tx, job_rx) = mpsc::channel(job_queue_size);
        let (result_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        (
            Self {
                assignments: store.clone(),
                availability: store.clone(),
                store,
                job_tx,
                result_events_tx,
                alternative_date_window,
                metrics: Metrics::new(),
            },
            job_rx,
        )
    }
}
