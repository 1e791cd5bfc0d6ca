use metrics::{counter, histogram};
use tracing::trace;

// Each helper records into the installed Prometheus recorder and mirrors the
// value as a trace event under `optimizer.metrics`.

pub fn inc_requests(route: &'static str) {
    counter!("optimizer_requests_total", "route" => route).increment(1);
    trace!(
        target = "optimizer.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    histogram!("optimizer_stage_duration_ms", "stage" => stage).record(elapsed_ms as f64);
    trace!(
        target = "optimizer.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}

pub fn tier_outcome(engine: &str, outcome: &'static str, elapsed_ms: u128) {
    counter!(
        "optimizer_tier_outcomes_total",
        "engine" => engine.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    trace!(
        target = "optimizer.metrics",
        engine = engine,
        outcome = outcome,
        elapsed_ms = elapsed_ms as u64,
        "tier_outcome"
    );
}
