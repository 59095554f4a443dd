//! Viewport sync decision engine.
//!
//! This module implements the **Functional Core** of the map data sync.
//! It acts as a pure state machine:
//! - **Input**: `EngineEvent` (map, visibility and fetch signals).
//! - **Output**: `Vec<EngineCommand>` (side effects the runtime must execute).
//!
//! # Architecture guarantees
//! * **No Network**: fetches are requested as commands, never performed here.
//! * **No Async, no clocks**: timers are armed and cancelled through commands.
//! * **Deterministic**: the same sequence of events always yields the same commands.

pub mod bounds_cache;
pub mod gate;
mod logic;
pub mod policy;
pub mod poll;
pub mod state;
pub mod types;


pub use bounds_cache::BoundsCache;
pub use gate::RequestGate;
pub use policy::ViewportPolicy;
pub use poll::{PollLoop, PollState};
pub use types::{EngineCommand, EngineEvent, Ticket};

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::sync::domain::{EntityClass, PerClass, Selection, Stop, Vehicle, Viewport};
use crate::sync::snapshot::MapSnapshot;

use state::EngineState;

/// The synchronization "Brain".
///
/// `SyncEngine` owns the high-water marks, collections, loading flags and
/// request slots of one map view, and decides what to fetch and when.
#[derive(Debug)]
pub struct SyncEngine {
    state: EngineState,
}

impl SyncEngine {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            state: EngineState {
                policy: ViewportPolicy::from_config(config),
                bounds: BoundsCache::new(),
                gate: RequestGate::new(),
                poll: PollLoop::new(config.poll_interval),
                vehicles: None,
                stops: None,
                selection: Selection::None,
                viewport: None,
                visible: true,
            },
        }
    }

    /// The main event handler.
    ///
    /// Consumes an event and returns the commands the runtime must execute,
    /// in order.
    pub fn handle_event(&mut self, event: EngineEvent) -> Vec<EngineCommand> {
        match event {
            EngineEvent::Loaded(viewport) => logic::on_loaded(&mut self.state, viewport),
            EngineEvent::MoveEnd(viewport) => logic::on_move_end(&mut self.state, viewport),
            EngineEvent::VisibilityChanged { visible } => {
                logic::on_visibility_changed(&mut self.state, visible)
            }
            EngineEvent::FetchSettled { ticket, result } => {
                logic::on_fetch_settled(&mut self.state, ticket, result)
            }
            EngineEvent::PollTimerFired => logic::on_poll_timer(&mut self.state),
            EngineEvent::Select(selection) => logic::on_select(&mut self.state, selection),
            EngineEvent::TornDown => logic::on_torn_down(&mut self.state),
        }
    }

    pub fn vehicles(&self) -> Option<&[Vehicle]> {
        self.state.vehicles.as_deref().map(Vec::as_slice)
    }

    pub fn stops(&self) -> Option<&[Stop]> {
        self.state.stops.as_deref().map(Vec::as_slice)
    }

    pub fn is_loading(&self, class: EntityClass) -> bool {
        self.state.gate.is_loading(class)
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.state.viewport.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn poll_state(&self) -> PollState {
        self.state.poll.state()
    }

    pub fn bounds_cache(&self) -> &BoundsCache {
        &self.state.bounds
    }

    pub fn snapshot(&self) -> MapSnapshot {
        let zoom = self.state.viewport.map(|v| v.zoom);
        let shown = |class: EntityClass| zoom.is_some_and(|z| self.state.policy.is_eligible(class, z));

        MapSnapshot {
            zoom,
            vehicles: self.state.vehicles.as_ref().map(Arc::clone),
            stops: self.state.stops.as_ref().map(Arc::clone),
            loading: PerClass::new(
                self.is_loading(EntityClass::Vehicles),
                self.is_loading(EntityClass::Stops),
            ),
            shown: PerClass::new(shown(EntityClass::Vehicles), shown(EntityClass::Stops)),
            selection: self.state.selection.clone(),
            saturation_threshold: self.state.policy.saturation_threshold,
        }
    }
}
