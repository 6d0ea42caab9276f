//! Prometheus exposition of cache and request-lane counters.
//!
//! Counters live in [`CacheStats`] and [`LaneStats`]; this module only turns a
//! snapshot of them into the text format.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::cache::store::CacheStats;
use crate::fetch::coordinator::{Lane, LaneStats};

/// Render a snapshot in the Prometheus text format.
pub fn render(cache: &CacheStats, lanes: &[(Lane, LaneStats)]) -> Result<String, prometheus::Error> {
    let registry = Registry::new_custom(Some("feed_pager".to_string()), None)?;

    let entries = IntGauge::new("cache_entries", "Pages currently cached")?;
    entries.set(cache.entries as i64);
    registry.register(Box::new(entries.clone()))?;

    let capacity = IntGauge::new("cache_capacity", "Maximum number of cached pages")?;
    capacity.set(cache.capacity as i64);
    registry.register(Box::new(capacity.clone()))?;

    let lookups = IntCounterVec::new(
        Opts::new("cache_events_total", "Cache lookups and removals"),
        &["event"],
    )?;
    lookups.with_label_values(&["hit"]).inc_by(cache.hits);
    lookups.with_label_values(&["miss"]).inc_by(cache.misses);
    lookups.with_label_values(&["eviction"]).inc_by(cache.evictions);
    lookups.with_label_values(&["expiration"]).inc_by(cache.expirations);
    registry.register(Box::new(lookups.clone()))?;

    let requests = IntCounterVec::new(
        Opts::new("requests_total", "Page fetches by lane and result"),
        &["lane", "result"],
    )?;
    for (lane, stats) in lanes {
        let lane = lane.to_string();
        requests.with_label_values(&[lane.as_str(), "issued"]).inc_by(stats.issued);
        requests.with_label_values(&[lane.as_str(), "completed"]).inc_by(stats.completed);
        requests.with_label_values(&[lane.as_str(), "failed"]).inc_by(stats.failed);
        requests.with_label_values(&[lane.as_str(), "cancelled"]).inc_by(stats.cancelled);
    }
    registry.register(Box::new(requests.clone()))?;

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
