use std::sync::Arc;

use crate::sync::domain::{EntityClass, Selection, Stop, Vehicle, Viewport};
use crate::sync::engine::bounds_cache::BoundsCache;
use crate::sync::engine::gate::RequestGate;
use crate::sync::engine::policy::ViewportPolicy;
use crate::sync::engine::poll::PollLoop;

#[derive(Debug)]
pub struct EngineState {
    pub policy: ViewportPolicy,
    pub bounds: BoundsCache,
    pub gate: RequestGate,
    pub poll: PollLoop,

    /// Latest successful collections; `None` until the first success.
    pub vehicles: Option<Arc<Vec<Vehicle>>>,
    pub stops: Option<Arc<Vec<Stop>>>,

    pub selection: Selection,

    /// Most recent viewport reported by the map, if it has loaded.
    pub viewport: Option<Viewport>,
    pub visible: bool,
}

impl EngineState {
    /// Size of the current collection of `class` (0 when absent).
    pub fn count(&self, class: EntityClass) -> usize {
        match class {
            EntityClass::Vehicles => self.vehicles.as_ref().map_or(0, |v| v.len()),
            EntityClass::Stops => self.stops.as_ref().map_or(0, |s| s.len()),
        }
    }
}
