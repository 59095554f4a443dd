use crate::config::SyncConfig;
use crate::sync::domain::{Bounds, EntityClass, Viewport};
use crate::sync::engine::bounds_cache::covers;

/// Pure fetch decision per entity class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportPolicy {
    pub vehicles_min_zoom: f64,
    pub stops_min_zoom: f64,
    pub saturation_threshold: usize,
}

impl Default for ViewportPolicy {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl ViewportPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            vehicles_min_zoom: config.vehicles_min_zoom,
            stops_min_zoom: config.stops_min_zoom,
            saturation_threshold: config.saturation_threshold,
        }
    }

    /// Whether `class` is shown at all at `zoom`.
    ///
    /// Stops additionally require vehicles to be eligible.
    pub fn is_eligible(&self, class: EntityClass, zoom: f64) -> bool {
        let vehicles = zoom >= self.vehicles_min_zoom;
        match class {
            EntityClass::Vehicles => vehicles,
            EntityClass::Stops => vehicles && zoom >= self.stops_min_zoom,
        }
    }

    /// A result this large may be clipped and can not vouch for its extent.
    pub fn is_saturated(&self, count: usize) -> bool {
        count >= self.saturation_threshold
    }

    /// Whether `class` must be (re)fetched for `viewport`, given its
    /// high-water mark and the size of its current collection.
    pub fn decide(
        &self,
        class: EntityClass,
        viewport: &Viewport,
        mark: Option<&Bounds>,
        count: usize,
    ) -> bool {
        if !self.is_eligible(class, viewport.zoom) {
            return false;
        }

        if !covers(mark, &viewport.bounds) {
            return true;
        }

        class == EntityClass::Vehicles && self.is_saturated(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> Bounds {
        Bounds::new(-2.7, 51.4, -2.5, 51.5)
    }

    fn inner() -> Bounds {
        Bounds::new(-2.65, 51.42, -2.55, 51.48)
    }

    #[test]
    fn zoom_gating() {
        let policy = ViewportPolicy::default();

        let far = Viewport::new(area(), 5.0);
        assert!(!policy.decide(EntityClass::Vehicles, &far, None, 0));
        assert!(!policy.decide(EntityClass::Stops, &far, None, 0));

        let mid = Viewport::new(area(), 13.0);
        assert!(policy.decide(EntityClass::Vehicles, &mid, None, 0));
        assert!(!policy.decide(EntityClass::Stops, &mid, None, 0));

        let near = Viewport::new(area(), 15.0);
        assert!(policy.decide(EntityClass::Vehicles, &near, None, 0));
        assert!(policy.decide(EntityClass::Stops, &near, None, 0));
    }

    #[test]
    fn stops_are_gated_by_vehicles_eligibility() {
        // a configuration where the stops threshold alone would pass
        let policy = ViewportPolicy {
            vehicles_min_zoom: 10.0,
            stops_min_zoom: 8.0,
            saturation_threshold: 1000,
        };
        assert!(!policy.is_eligible(EntityClass::Stops, 9.0));
        assert!(policy.is_eligible(EntityClass::Stops, 10.0));
    }

    #[test]
    fn covered_viewport_needs_no_fetch() {
        let policy = ViewportPolicy::default();
        let viewport = Viewport::new(inner(), 15.0);

        assert!(!policy.decide(EntityClass::Vehicles, &viewport, Some(&area()), 10));
        assert!(!policy.decide(EntityClass::Stops, &viewport, Some(&area()), 10));

        let outside = Viewport::new(Bounds::new(-2.9, 51.42, -2.55, 51.48), 15.0);
        assert!(policy.decide(EntityClass::Vehicles, &outside, Some(&area()), 10));
    }

    #[test]
    fn saturation_forces_vehicles_refetch_only() {
        let policy = ViewportPolicy::default();
        let same = Viewport::new(area(), 15.0);
        let sub = Viewport::new(inner(), 15.0);

        assert!(policy.decide(EntityClass::Vehicles, &same, Some(&area()), 1000));
        assert!(policy.decide(EntityClass::Vehicles, &sub, Some(&area()), 1500));
        assert!(!policy.decide(EntityClass::Vehicles, &sub, Some(&area()), 999));
        assert!(!policy.decide(EntityClass::Stops, &sub, Some(&area()), 5000));
    }
}
