use std::fmt;
use std::ops::{Index, IndexMut};

use serde::Deserialize;

use super::geo::LngLat;

/// The two independently synchronized kinds of map data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityClass {
    Vehicles,
    Stops,
}

impl EntityClass {
    pub const ALL: [EntityClass; 2] = [EntityClass::Vehicles, EntityClass::Stops];

    /// Path stem of the data endpoint serving this class.
    pub fn endpoint(self) -> &'static str {
        match self {
            EntityClass::Vehicles => "vehicles",
            EntityClass::Stops => "stops",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// One value per entity class, indexable by [`EntityClass`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerClass<T> {
    pub vehicles: T,
    pub stops: T,
}

impl<T> PerClass<T> {
    pub fn new(vehicles: T, stops: T) -> Self {
        Self { vehicles, stops }
    }
}

impl<T> Index<EntityClass> for PerClass<T> {
    type Output = T;

    fn index(&self, class: EntityClass) -> &T {
        match class {
            EntityClass::Vehicles => &self.vehicles,
            EntityClass::Stops => &self.stops,
        }
    }
}

impl<T> IndexMut<EntityClass> for PerClass<T> {
    fn index_mut(&mut self, class: EntityClass) -> &mut T {
        match class {
            EntityClass::Vehicles => &mut self.vehicles,
            EntityClass::Stops => &mut self.stops,
        }
    }
}

// ================================
// Vehicles
// ================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VehicleDetails {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub colour: Option<String>,
    #[serde(default)]
    pub css: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceDetails {
    #[serde(default)]
    pub line_name: Option<String>,
}

/// A live vehicle position as served by `vehicles.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub coordinates: LngLat,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub vehicle: Option<VehicleDetails>,
    #[serde(default)]
    pub service: Option<ServiceDetails>,
}

impl Vehicle {
    /// Fill colour for the point rendering of this vehicle.
    ///
    /// Prefers the explicit livery colour, then a plain `#rrggbb` css value,
    /// then white.
    pub fn marker_colour(&self) -> &str {
        let details = self.vehicle.as_ref();

        if let Some(colour) = details.and_then(|d| d.colour.as_deref()) {
            if !colour.is_empty() {
                return colour;
            }
        }

        match details.and_then(|d| d.css.as_deref()) {
            Some(css) if css.len() == 7 => css,
            _ => "#fff",
        }
    }
}

// ================================
// Stops
// ================================

/// A stop marker as served by `stops.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    /// Stop page path, e.g. `/stops/0100BRP90310`.
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub bearing: Option<f64>,
    pub coordinates: LngLat,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StopFeatureCollection {
    #[serde(default)]
    features: Vec<StopFeature>,
}

#[derive(Debug, Deserialize)]
struct StopFeature {
    properties: StopProperties,
    geometry: PointGeometry,
}

#[derive(Debug, Deserialize)]
struct StopProperties {
    url: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    bearing: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    coordinates: LngLat,
}

impl StopFeatureCollection {
    pub(crate) fn into_stops(self) -> Vec<Stop> {
        self.features
            .into_iter()
            .map(|f| Stop {
                id: f.properties.url,
                name: f.properties.name,
                icon: f.properties.icon,
                bearing: f.properties.bearing,
                coordinates: f.geometry.coordinates,
            })
            .collect()
    }
}

// ================================
// Collections and selection
// ================================

/// Payload of one successful fetch. Always replaces the previous collection
/// of its class wholesale.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityCollection {
    Vehicles(Vec<Vehicle>),
    Stops(Vec<Stop>),
}

impl EntityCollection {
    pub fn class(&self) -> EntityClass {
        match self {
            EntityCollection::Vehicles(_) => EntityClass::Vehicles,
            EntityCollection::Stops(_) => EntityClass::Stops,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EntityCollection::Vehicles(v) => v.len(),
            EntityCollection::Stops(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The clicked entity, if any. A vehicle and a stop are never selected at
/// the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Vehicle(u64),
    Stop(String),
}

impl Selection {
    /// Seeds a stop selection when the page was reached from a stop page.
    pub fn from_referrer(path: &str) -> Self {
        if path.starts_with("/stops/") {
            Selection::Stop(path.to_string())
        } else {
            Selection::None
        }
    }

    pub fn vehicle_id(&self) -> Option<u64> {
        match self {
            Selection::Vehicle(id) => Some(*id),
            _ => None,
        }
    }

    pub fn stop_id(&self) -> Option<&str> {
        match self {
            Selection::Stop(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }
}
