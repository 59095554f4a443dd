use std::sync::Arc;

use crate::sync::domain::{
    Bounds, EntityClass, EntityCollection, Selection, Viewport,
};
use crate::sync::endpoints::FetchError;
use crate::sync::engine::poll::PollState;
use crate::sync::engine::state::EngineState;
use crate::sync::engine::types::{EngineCommand, Ticket};

pub fn on_loaded(state: &mut EngineState, viewport: Viewport) -> Vec<EngineCommand> {
    log::info!("[ENGINE] on_loaded: zoom {:.2}", viewport.zoom);
    state.viewport = Some(viewport);

    let mut cmds = Vec::new();
    sync_viewport(state, &viewport, &mut cmds);
    cmds
}

pub fn on_move_end(state: &mut EngineState, viewport: Viewport) -> Vec<EngineCommand> {
    log::debug!(
        "[ENGINE] on_move_end: zoom {:.2} {:?}",
        viewport.zoom,
        viewport.bounds
    );
    state.viewport = Some(viewport);

    let mut cmds = Vec::new();
    sync_viewport(state, &viewport, &mut cmds);
    cmds.push(EngineCommand::PersistView(viewport));
    cmds
}

pub fn on_visibility_changed(state: &mut EngineState, visible: bool) -> Vec<EngineCommand> {
    let was_visible = std::mem::replace(&mut state.visible, visible);
    let mut cmds = Vec::new();

    if !visible || was_visible {
        // Going hidden leaves in-flight requests alone; the poll loop simply
        // will not re-arm until we are visible again.
        log::debug!("[ENGINE] visibility -> {}", visible);
        return cmds;
    }

    let Some(viewport) = state.viewport else {
        return cmds;
    };

    if !state.policy.is_eligible(EntityClass::Vehicles, viewport.zoom) {
        return cmds;
    }

    log::debug!("[ENGINE] visible again: refreshing vehicles now");
    issue_fetch(state, EntityClass::Vehicles, viewport.bounds, &mut cmds);

    let stops = EntityClass::Stops;
    if state.policy.decide(
        stops,
        &viewport,
        state.bounds.mark(stops),
        state.count(stops),
    ) {
        issue_fetch(state, stops, viewport.bounds, &mut cmds);
    }

    cmds
}

pub fn on_fetch_settled(
    state: &mut EngineState,
    ticket: Ticket,
    result: Result<EntityCollection, FetchError>,
) -> Vec<EngineCommand> {
    let Some(issued_for) = state.gate.settle(ticket) else {
        log::trace!("[ENGINE] ignoring stale settlement {:?}", ticket);
        return Vec::new();
    };

    match result {
        Ok(collection) if collection.class() == ticket.class => {
            apply_collection(state, issued_for, collection);
        }
        Ok(collection) => {
            log::warn!(
                "[ENGINE] {} request answered with {} payload, ignored",
                ticket.class,
                collection.class()
            );
        }
        Err(err) => {
            // Stale data (if any) stays on the map.
            log::debug!("[ENGINE] {} fetch failed: {}", ticket.class, err);
        }
    }

    let mut cmds = Vec::new();
    if ticket.class == EntityClass::Vehicles {
        if let Some(delay) = state.poll.cycle_settled(state.visible) {
            cmds.push(EngineCommand::SchedulePoll(delay));
        }
    }
    cmds
}

pub fn on_poll_timer(state: &mut EngineState) -> Vec<EngineCommand> {
    let mut cmds = Vec::new();

    if !state.poll.timer_fired() {
        return cmds;
    }

    let Some(viewport) = state.viewport else {
        return cmds;
    };

    if !state.policy.is_eligible(EntityClass::Vehicles, viewport.zoom) {
        return cmds;
    }

    log::trace!("[ENGINE] poll tick");
    issue_fetch(state, EntityClass::Vehicles, viewport.bounds, &mut cmds);
    cmds
}

pub fn on_select(state: &mut EngineState, selection: Selection) -> Vec<EngineCommand> {
    log::trace!("[ENGINE] select {:?}", selection);
    state.selection = selection;
    Vec::new()
}

pub fn on_torn_down(state: &mut EngineState) -> Vec<EngineCommand> {
    log::info!("[ENGINE] view torn down");

    let mut cmds: Vec<EngineCommand> = state
        .gate
        .revoke_all()
        .into_iter()
        .map(EngineCommand::CancelFetch)
        .collect();

    if state.poll.stop() {
        cmds.push(EngineCommand::CancelPoll);
    }

    state.bounds.reset_all();
    state.vehicles = None;
    state.stops = None;
    state.selection = Selection::None;
    state.viewport = None;

    cmds
}

// ================================
// Helpers
// ================================

fn sync_viewport(state: &mut EngineState, viewport: &Viewport, cmds: &mut Vec<EngineCommand>) {
    let vehicles_eligible = state.policy.is_eligible(EntityClass::Vehicles, viewport.zoom);
    if !vehicles_eligible && state.poll.stop() {
        cmds.push(EngineCommand::CancelPoll);
    }

    // An idle loop restarts as soon as vehicles are eligible again, even
    // over an extent that is already covered. A request still in flight
    // becomes the running cycle, so its settlement arms the next timer.
    let mut restart_poll = vehicles_eligible && state.poll.state() == PollState::Idle;
    if restart_poll && state.gate.is_loading(EntityClass::Vehicles) {
        log::debug!("[ENGINE] poll resumes on the live vehicles request");
        state.poll.begin_cycle();
        restart_poll = false;
    }

    for class in EntityClass::ALL {
        let mark = state.bounds.mark(class);
        let due = state.policy.decide(class, viewport, mark, state.count(class));
        if due || (class == EntityClass::Vehicles && restart_poll) {
            issue_fetch(state, class, viewport.bounds, cmds);
        }
    }
}

fn issue_fetch(
    state: &mut EngineState,
    class: EntityClass,
    bounds: Bounds,
    cmds: &mut Vec<EngineCommand>,
) {
    if class == EntityClass::Vehicles {
        if !state.visible {
            log::debug!("[ENGINE] page hidden, vehicles not fetched");
            return;
        }
        if state.poll.begin_cycle() {
            cmds.push(EngineCommand::CancelPoll);
        }
    }

    let (ticket, superseded) = state.gate.issue(class, bounds);
    if let Some(old) = superseded {
        log::debug!("[ENGINE] {:?} superseded by {:?}", old, ticket);
        cmds.push(EngineCommand::CancelFetch(old));
    }
    cmds.push(EngineCommand::Fetch { ticket, bounds });
}

/// Replaces the collection wholesale, records the mark for the extent the
/// request was issued for, and drops a selection that did not survive.
fn apply_collection(state: &mut EngineState, issued_for: Bounds, collection: EntityCollection) {
    let class = collection.class();
    log::debug!("[ENGINE] {} updated: {} items", class, collection.len());

    state.bounds.record_success(class, issued_for);

    match collection {
        EntityCollection::Vehicles(vehicles) => {
            if let Some(id) = state.selection.vehicle_id() {
                if !vehicles.iter().any(|v| v.id == id) {
                    log::debug!("[ENGINE] selected vehicle {} gone", id);
                    state.selection = Selection::None;
                }
            }
            state.vehicles = Some(Arc::new(vehicles));
        }
        EntityCollection::Stops(stops) => {
            if let Some(id) = state.selection.stop_id() {
                if !stops.iter().any(|s| s.id == id) {
                    log::debug!("[ENGINE] selected stop {} gone", id);
                    state.selection = Selection::None;
                }
            }
            state.stops = Some(Arc::new(stops));
        }
    }
}
