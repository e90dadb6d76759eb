// Prometheus metrics definitions for the ladder backend.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Players currently on the ladder.
    pub static ref LADDER_PLAYERS: IntGauge =
        IntGauge::new("ladder_players", "Players currently on the ladder").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total players registered.
    pub static ref PLAYERS_REGISTERED_TOTAL: IntCounter = IntCounter::new(
        "ladder_players_registered_total",
        "Total players registered",
    )
    .unwrap();

    /// Total matches recorded, by outcome (defended, minor_upset, major_upset).
    pub static ref MATCHES_RECORDED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ladder_matches_recorded_total", "Total matches recorded"),
        &["outcome"],
    )
    .unwrap();

    /// Match submissions rejected before any state change, by reason.
    pub static ref MATCH_REJECTIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "ladder_match_rejections_total",
            "Match submissions rejected before any state change",
        ),
        &["reason"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(LADDER_PLAYERS.clone()),
        Box::new(PLAYERS_REGISTERED_TOTAL.clone()),
        Box::new(MATCHES_RECORDED_TOTAL.clone()),
        Box::new(MATCH_REJECTIONS_TOTAL.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
