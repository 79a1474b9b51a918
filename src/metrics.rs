// Prometheus metrics definitions for the racing backend.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Cars currently on the track (0, 1, or 2).
    pub static ref TRACK_OCCUPANCY: IntGauge =
        IntGauge::new("racing_track_occupancy", "Cars currently on the track").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Races resolved successfully.
    pub static ref RACES_RUN_TOTAL: IntCounter =
        IntCounter::new("racing_races_run_total", "Races resolved successfully").unwrap();

    /// Races aborted before resolution.
    pub static ref RACES_FAILED_TOTAL: IntCounter =
        IntCounter::new("racing_races_failed_total", "Races aborted before resolution").unwrap();

    /// Car lookups served from the TTL cache.
    pub static ref CACHE_HITS_TOTAL: IntCounter =
        IntCounter::new("racing_cache_hits_total", "Car lookups served from cache").unwrap();

    /// Car lookups that went to the store.
    pub static ref CACHE_MISSES_TOTAL: IntCounter =
        IntCounter::new("racing_cache_misses_total", "Car lookups that hit the store").unwrap();

    /// Failed draws from the randomness source.
    pub static ref RANDOM_FAILURES_TOTAL: IntCounter =
        IntCounter::new("racing_random_failures_total", "Failed randomness draws").unwrap();

    /// Cars registered.
    pub static ref CARS_CREATED_TOTAL: IntCounter =
        IntCounter::new("racing_cars_created_total", "Cars registered").unwrap();

    /// Cars deleted.
    pub static ref CARS_DELETED_TOTAL: IntCounter =
        IntCounter::new("racing_cars_deleted_total", "Cars deleted").unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TRACK_OCCUPANCY.clone()),
        Box::new(RACES_RUN_TOTAL.clone()),
        Box::new(RACES_FAILED_TOTAL.clone()),
        Box::new(CACHE_HITS_TOTAL.clone()),
        Box::new(CACHE_MISSES_TOTAL.clone()),
        Box::new(RANDOM_FAILURES_TOTAL.clone()),
        Box::new(CARS_CREATED_TOTAL.clone()),
        Box::new(CARS_DELETED_TOTAL.clone()),
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
