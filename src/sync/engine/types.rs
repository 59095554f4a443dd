use std::time::Duration;

use crate::sync::domain::{Bounds, EntityClass, EntityCollection, Selection, Viewport};
use crate::sync::endpoints::FetchError;

/// Identity of one issued fetch: its class plus a per-class generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub class: EntityClass,
    pub generation: u64,
}

impl Ticket {
    pub fn new(class: EntityClass, generation: u64) -> Self {
        Self { class, generation }
    }
}

#[derive(Debug)]
pub enum EngineEvent {
    /// The map finished its initial load.
    Loaded(Viewport),
    /// A (debounced) move-end.
    MoveEnd(Viewport),
    VisibilityChanged { visible: bool },
    FetchSettled {
        ticket: Ticket,
        result: Result<EntityCollection, FetchError>,
    },
    PollTimerFired,
    Select(Selection),
    TornDown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Abort the request behind this ticket; its outcome will be ignored.
    CancelFetch(Ticket),
    Fetch { ticket: Ticket, bounds: Bounds },
    /// Arm the poll timer, measured from now.
    SchedulePoll(Duration),
    CancelPoll,
    /// Remember this viewport across sessions (best effort).
    PersistView(Viewport),
}
