use crate::sync::domain::{Bounds, EntityClass, PerClass};
use crate::sync::engine::types::Ticket;

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    bounds: Bounds,
}

#[derive(Debug, Default)]
struct Slot {
    /// Last generation handed out. Never reset, so tickets from before a
    /// teardown can not collide with later ones.
    issued: u64,
    in_flight: Option<InFlight>,
}

/// Single-slot request gate per entity class.
///
/// Issuing a request revokes whatever was in flight for the same class.
/// Settlements are matched by generation, so a revoked request that resolves
/// anyway is recognised and dropped. The loading flag is simply "the slot
/// holds a live request".
#[derive(Debug, Default)]
pub struct RequestGate {
    slots: PerClass<Slot>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request for `class`, remembering the extent it was
    /// issued for.
    ///
    /// Returns the new ticket and, if a request was still outstanding, the
    /// ticket it superseded.
    pub fn issue(&mut self, class: EntityClass, bounds: Bounds) -> (Ticket, Option<Ticket>) {
        let slot = &mut self.slots[class];
        slot.issued += 1;

        let superseded = slot
            .in_flight
            .replace(InFlight {
                generation: slot.issued,
                bounds,
            })
            .map(|old| Ticket::new(class, old.generation));

        (Ticket::new(class, slot.issued), superseded)
    }

    /// Accepts the settlement of `ticket` if it is still the live request of
    /// its class, clearing the slot.
    ///
    /// Returns the extent captured when the request was issued, or `None`
    /// for a stale ticket, whose settlement must have no effect.
    pub fn settle(&mut self, ticket: Ticket) -> Option<Bounds> {
        let slot = &mut self.slots[ticket.class];
        match slot.in_flight {
            Some(live) if live.generation == ticket.generation => {
                slot.in_flight = None;
                Some(live.bounds)
            }
            _ => None,
        }
    }

    pub fn is_loading(&self, class: EntityClass) -> bool {
        self.slots[class].in_flight.is_some()
    }

    /// Revokes every live request, returning their tickets.
    pub fn revoke_all(&mut self) -> Vec<Ticket> {
        EntityClass::ALL
            .into_iter()
            .filter_map(|class| {
                self.slots[class]
                    .in_flight
                    .take()
                    .map(|live| Ticket::new(class, live.generation))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(offset: f64) -> Bounds {
        Bounds::new(-2.7 + offset, 51.4, -2.5 + offset, 51.5)
    }

    #[test]
    fn issue_sets_loading_and_settle_clears_it() {
        let mut gate = RequestGate::new();
        assert!(!gate.is_loading(EntityClass::Vehicles));

        let (ticket, superseded) = gate.issue(EntityClass::Vehicles, area(0.0));
        assert!(superseded.is_none());
        assert!(gate.is_loading(EntityClass::Vehicles));
        assert!(!gate.is_loading(EntityClass::Stops));

        assert_eq!(gate.settle(ticket), Some(area(0.0)));
        assert!(!gate.is_loading(EntityClass::Vehicles));
    }

    #[test]
    fn second_issue_supersedes_first() {
        let mut gate = RequestGate::new();
        let (first, _) = gate.issue(EntityClass::Stops, area(0.0));
        let (second, superseded) = gate.issue(EntityClass::Stops, area(0.1));

        assert_eq!(superseded, Some(first));
        assert_ne!(first, second);

        // the stale settlement is ignored and does not clear loading
        assert_eq!(gate.settle(first), None);
        assert!(gate.is_loading(EntityClass::Stops));

        assert_eq!(gate.settle(second), Some(area(0.1)));
        assert!(!gate.is_loading(EntityClass::Stops));

        // a late duplicate of the live one is stale too
        assert_eq!(gate.settle(second), None);
    }

    #[test]
    fn classes_have_independent_slots() {
        let mut gate = RequestGate::new();
        let (vehicles, _) = gate.issue(EntityClass::Vehicles, area(0.0));
        let (_, superseded) = gate.issue(EntityClass::Stops, area(0.0));

        assert!(superseded.is_none());
        assert!(gate.is_loading(EntityClass::Vehicles));
        assert_eq!(gate.settle(vehicles), Some(area(0.0)));
        assert!(gate.is_loading(EntityClass::Stops));
    }

    #[test]
    fn revoked_tickets_stay_stale_after_reissue() {
        let mut gate = RequestGate::new();
        let (old, _) = gate.issue(EntityClass::Vehicles, area(0.0));

        assert_eq!(gate.revoke_all(), vec![old]);
        assert!(!gate.is_loading(EntityClass::Vehicles));

        let (fresh, superseded) = gate.issue(EntityClass::Vehicles, area(0.0));
        assert!(superseded.is_none());
        assert_eq!(gate.settle(old), None);
        assert!(gate.settle(fresh).is_some());
    }
}
