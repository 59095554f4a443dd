//! Single-journey view: one-shot detail fetch plus live following of the
//! journey's vehicle while the journey is running.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::sync::domain::{extent, Bounds, LngLat, Vehicle};
use crate::sync::endpoints::{FetchError, MapApi};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JourneyStop {
    #[serde(default)]
    pub atco_code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub aimed_arrival_time: Option<String>,
    #[serde(default)]
    pub aimed_departure_time: Option<String>,
    #[serde(default)]
    pub actual_departure_time: Option<String>,
    #[serde(default)]
    pub minor: bool,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub coordinates: Option<LngLat>,
}

/// A recorded position of the vehicle along the journey.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JourneyLocation {
    pub coordinates: LngLat,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub direction: Option<f64>,
    pub datetime: String,
}

/// Pointer to the previous or next journey of the same vehicle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JourneyLink {
    pub id: u64,
    pub datetime: String,
}

/// Journey detail as served by `journeys/<id>.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Journey {
    pub datetime: String,
    #[serde(default)]
    pub route_name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub stops: Vec<JourneyStop>,
    #[serde(default)]
    pub locations: Vec<JourneyLocation>,
    #[serde(default)]
    pub vehicle: Option<String>,
    /// Whether the journey is running now, so its vehicle is worth following.
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub next: Option<JourneyLink>,
    #[serde(default)]
    pub previous: Option<JourneyLink>,
}

impl Journey {
    /// Extent to fit the map to: every recorded location plus every stop
    /// with known coordinates.
    pub fn fit_bounds(&self) -> Option<Bounds> {
        let locations = self.locations.iter().map(|l| l.coordinates);
        let stops = self.stops.iter().filter_map(|s| s.coordinates);
        extent(locations.chain(stops))
    }

    /// Heading line, e.g. `"72 to Temple Meads"`, or the vehicle name when
    /// the journey carries one.
    pub fn title(&self) -> String {
        if let Some(vehicle) = &self.vehicle {
            return vehicle.clone();
        }
        let route = self.route_name.as_deref().unwrap_or_default();
        match &self.destination {
            Some(destination) if !destination.is_empty() => {
                format!("{} to {}", route, destination)
            }
            _ => route.to_string(),
        }
    }
}

/// An open journey view.
///
/// Dropping it stops following the vehicle.
pub struct JourneyView {
    journey: Journey,
    vehicle: watch::Receiver<Option<Vehicle>>,
    follower: Option<JoinHandle<()>>,
}

impl JourneyView {
    /// Fetches journey `journey_id` and, if the journey is current and a
    /// vehicle id is known, starts refreshing that vehicle every `interval`.
    pub async fn open<A: MapApi>(
        api: Arc<A>,
        journey_id: u64,
        vehicle_id: Option<u64>,
        interval: Duration,
    ) -> Result<Self, FetchError> {
        let journey = api.fetch_journey(journey_id).await?;
        log::info!(
            "[JOURNEY] {} loaded: {} stops, {} locations",
            journey_id,
            journey.stops.len(),
            journey.locations.len()
        );

        let (tx, rx) = watch::channel(None);
        let follower = match vehicle_id {
            Some(id) if journey.current => {
                log::debug!("[JOURNEY] following vehicle {}", id);
                Some(tokio::spawn(follow(api, id, interval, tx)))
            }
            _ => None,
        };

        Ok(Self {
            journey,
            vehicle: rx,
            follower,
        })
    }

    pub fn journey(&self) -> &Journey {
        &self.journey
    }

    pub fn fit_bounds(&self) -> Option<Bounds> {
        self.journey.fit_bounds()
    }

    /// Latest known position of the followed vehicle.
    pub fn vehicle(&self) -> Option<Vehicle> {
        self.vehicle.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vehicle>> {
        self.vehicle.clone()
    }

    pub fn is_following(&self) -> bool {
        self.follower.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for JourneyView {
    fn drop(&mut self) {
        if let Some(task) = self.follower.take() {
            task.abort();
        }
    }
}

/// Refreshes one vehicle until it disappears or a request fails.
async fn follow<A: MapApi>(
    api: Arc<A>,
    vehicle_id: u64,
    interval: Duration,
    tx: watch::Sender<Option<Vehicle>>,
) {
    loop {
        match api.fetch_vehicle(vehicle_id).await {
            Ok(Some(vehicle)) => {
                tx.send_replace(Some(vehicle));
            }
            Ok(None) => {
                log::debug!("[JOURNEY] vehicle {} no longer tracked", vehicle_id);
                return;
            }
            Err(err) => {
                log::debug!("[JOURNEY] vehicle {} refresh failed: {}", vehicle_id, err);
                return;
            }
        }
        tokio::time::sleep(interval).await;
    }
}
