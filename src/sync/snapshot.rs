//! Read-only view of the sync state handed to the presentation layer.

use std::sync::Arc;

use crate::config::SATURATION_THRESHOLD;
use crate::sync::domain::{EntityClass, PerClass, Selection, Stop, Vehicle};

/// How the vehicle layer should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleRendering {
    /// One marker per vehicle.
    Markers,
    /// A single point layer; used once the collection is saturated.
    Points,
}

#[derive(Debug, Clone)]
pub struct MapSnapshot {
    pub zoom: Option<f64>,
    pub vehicles: Option<Arc<Vec<Vehicle>>>,
    pub stops: Option<Arc<Vec<Stop>>>,
    pub loading: PerClass<bool>,
    /// Whether each class is shown at the current zoom. Collections of a
    /// hidden class are kept, just not displayed.
    pub shown: PerClass<bool>,
    pub selection: Selection,
    pub saturation_threshold: usize,
}

impl Default for MapSnapshot {
    fn default() -> Self {
        Self {
            zoom: None,
            vehicles: None,
            stops: None,
            loading: PerClass::default(),
            shown: PerClass::default(),
            selection: Selection::None,
            saturation_threshold: SATURATION_THRESHOLD,
        }
    }
}

impl MapSnapshot {
    pub fn visible_vehicles(&self) -> Option<&[Vehicle]> {
        self.vehicles
            .as_deref()
            .filter(|_| self.shown.vehicles)
            .map(Vec::as_slice)
    }

    pub fn visible_stops(&self) -> Option<&[Stop]> {
        self.stops
            .as_deref()
            .filter(|_| self.shown.stops)
            .map(Vec::as_slice)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.vehicles || self.loading.stops
    }

    pub fn vehicle_rendering(&self) -> VehicleRendering {
        let count = self.vehicles.as_ref().map_or(0, |v| v.len());
        if count >= self.saturation_threshold {
            VehicleRendering::Points
        } else {
            VehicleRendering::Markers
        }
    }

    pub fn selected_vehicle(&self) -> Option<&Vehicle> {
        let id = self.selection.vehicle_id()?;
        self.visible_vehicles()?.iter().find(|v| v.id == id)
    }

    pub fn selected_stop(&self) -> Option<&Stop> {
        let id = self.selection.stop_id()?;
        self.visible_stops()?.iter().find(|s| s.id == id)
    }

    /// Lines for the map status bar. Empty until the map has a zoom level.
    pub fn status_lines(&self) -> Vec<&'static str> {
        let mut lines = Vec::new();
        if self.zoom.is_none() {
            return lines;
        }

        if !self.shown[EntityClass::Stops] {
            lines.push("Zoom in to see stops");
        }
        if !self.shown[EntityClass::Vehicles] {
            lines.push("Zoom in to see buses");
        }
        if self.is_loading() {
            lines.push("Loading…");
        }
        lines
    }
}
