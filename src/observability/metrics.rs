use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::models::assignment::{DayAssignmentResult, TourAssignmentResult};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignment_runs_total: IntCounterVec,
    pub jobs_in_queue: IntGauge,
    pub assignment_latency_seconds: HistogramVec,
    pub bookings_flagged_total: IntCounterVec,
    pub vehicle_utilization: Histogram,
    pub availability_checks_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignment_runs_total = IntCounterVec::new(
            Opts::new("assignment_runs_total", "Assignment runs by scope and outcome"),
            &["scope", "outcome"],
        )
        .expect("valid assignment_runs_total metric");

        let jobs_in_queue = IntGauge::new("jobs_in_queue", "Assignment jobs waiting for the worker")
            .expect("valid jobs_in_queue metric");

        let assignment_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of assignment runs in seconds",
            ),
            &["scope"],
        )
        .expect("valid assignment_latency_seconds metric");

        let bookings_flagged_total = IntCounterVec::new(
            Opts::new("bookings_flagged_total", "Bookings left unassigned by flag type"),
            &["flag"],
        )
        .expect("valid bookings_flagged_total metric");

        let vehicle_utilization = Histogram::with_opts(
            HistogramOpts::new(
                "vehicle_utilization",
                "Seat utilization of used vehicles per tour run [0..1]",
            )
            .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
        )
        .expect("valid vehicle_utilization metric");

        let availability_checks_total = IntCounterVec::new(
            Opts::new("availability_checks_total", "Availability checks by result"),
            &["result"],
        )
        .expect("valid availability_checks_total metric");

        registry
            .register(Box::new(assignment_runs_total.clone()))
            .expect("register assignment_runs_total");
        registry
            .register(Box::new(jobs_in_queue.clone()))
            .expect("register jobs_in_queue");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(bookings_flagged_total.clone()))
            .expect("register bookings_flagged_total");
        registry
            .register(Box::new(vehicle_utilization.clone()))
            .expect("register vehicle_utilization");
        registry
            .register(Box::new(availability_checks_total.clone()))
            .expect("register availability_checks_total");

        Self {
            registry,
            assignment_runs_total,
            jobs_in_queue,
            assignment_latency_seconds,
            bookings_flagged_total,
            vehicle_utilization,
            availability_checks_total,
        }
    }

    pub fn record_tour(&self, result: &TourAssignmentResult, elapsed_seconds: f64) {
        let outcome = if result.success { "assigned" } else { "flagged" };
        self.assignment_runs_total
            .with_label_values(&["tour", outcome])
            .inc();
        self.assignment_latency_seconds
            .with_label_values(&["tour"])
            .observe(elapsed_seconds);
        self.observe_tour(result);
    }

    pub fn record_day(&self, result: &DayAssignmentResult, elapsed_seconds: f64) {
        let outcome = if result.needs_attention == 0 {
            "assigned"
        } else {
            "flagged"
        };
        self.assignment_runs_total
            .with_label_values(&["day", outcome])
            .inc();
        self.assignment_latency_seconds
            .with_label_values(&["day"])
            .observe(elapsed_seconds);

        for tour in result.tours.iter().filter_map(|tour| tour.result.as_ref()) {
            self.observe_tour(tour);
        }
    }

    pub fn record_failure(&self, scope: &str, elapsed_seconds: f64) {
        self.assignment_runs_total
            .with_label_values(&[scope, "error"])
            .inc();
        self.assignment_latency_seconds
            .with_label_values(&[scope])
            .observe(elapsed_seconds);
    }

    fn observe_tour(&self, result: &TourAssignmentResult) {
        for flag in &result.flags {
            self.bookings_flagged_total
                .with_label_values(&[flag.kind.as_str()])
                .inc();
        }
        if result.stats.guides_used > 0 {
            self.vehicle_utilization
                .observe(result.stats.vehicle_utilization);
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
