use std::time::Duration;

/// Vehicles are shown (and fetched) from this zoom level up.
pub const VEHICLES_MIN_ZOOM: f64 = 6.0;

/// Stops are shown (and fetched) from this zoom level up.
pub const STOPS_MIN_ZOOM: f64 = 14.0;

/// A vehicles response this large may have been clipped by the server.
pub const SATURATION_THRESHOLD: usize = 1000;

/// Delay between a settled vehicles fetch and the next poll.
pub const POLL_INTERVAL: Duration = Duration::from_secs(12);

/// Leading-edge debounce window for map move-end events.
pub const MOVE_DEBOUNCE: Duration = Duration::from_millis(400);

/// Trailing debounce window for persisting the last viewport.
pub const PERSIST_DEBOUNCE: Duration = Duration::from_secs(2);

/// Tunables for the sync engine and its runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub vehicles_min_zoom: f64,
    pub stops_min_zoom: f64,
    pub saturation_threshold: usize,
    pub poll_interval: Duration,
    pub move_debounce: Duration,
    pub persist_debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            vehicles_min_zoom: VEHICLES_MIN_ZOOM,
            stops_min_zoom: STOPS_MIN_ZOOM,
            saturation_threshold: SATURATION_THRESHOLD,
            poll_interval: POLL_INTERVAL,
            move_debounce: MOVE_DEBOUNCE,
            persist_debounce: PERSIST_DEBOUNCE,
        }
    }
}
