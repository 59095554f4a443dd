use crate::sync::domain::{Bounds, EntityClass, PerClass};

/// Containment test shared by the cache and the policy.
///
/// A degenerate extent is never considered covered, and neither is anything
/// when there is no mark yet.
pub fn covers(mark: Option<&Bounds>, bounds: &Bounds) -> bool {
    match mark {
        Some(mark) if !bounds.is_degenerate() => mark.covers(bounds),
        _ => false,
    }
}

/// Per-class high-water marks: the extent of the most recent successful
/// fetch.
///
/// Marks are only written after a fetch resolved successfully. They survive
/// visibility pauses and are discarded on view teardown.
#[derive(Debug, Default)]
pub struct BoundsCache {
    marks: PerClass<Option<Bounds>>,
}

impl BoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `bounds` as the mark for `class`.
    ///
    /// Returns `false` (and leaves the previous mark alone) for degenerate
    /// extents.
    pub fn record_success(&mut self, class: EntityClass, bounds: Bounds) -> bool {
        if bounds.is_degenerate() {
            log::debug!("[ENGINE] not recording degenerate {} extent", class);
            return false;
        }
        self.marks[class] = Some(bounds);
        true
    }

    pub fn covers(&self, class: EntityClass, bounds: &Bounds) -> bool {
        covers(self.mark(class), bounds)
    }

    pub fn mark(&self, class: EntityClass) -> Option<&Bounds> {
        self.marks[class].as_ref()
    }

    pub fn reset(&mut self, class: EntityClass) {
        self.marks[class] = None;
    }

    pub fn reset_all(&mut self) {
        for class in EntityClass::ALL {
            self.reset(class);
        }
    }
}
