use std::time::Duration;

use tokio::time::Instant;

/// Clock-free debouncer.
///
/// The owner feeds calls in with the current time and polls
/// [`Debouncer::poll_expired`] once [`Debouncer::deadline`] passes; it is
/// never woken by the debouncer itself.
///
/// A leading debouncer fires on the first call of a burst and then once
/// more with the latest value when the burst ends, provided the burst held
/// more than that first call. A trailing-only debouncer fires once, at the
/// end of the burst.
#[derive(Debug)]
pub struct Debouncer<T> {
    wait: Duration,
    leading: bool,
    deadline: Option<Instant>,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn leading(wait: Duration) -> Self {
        Self::with_edge(wait, true)
    }

    pub fn trailing(wait: Duration) -> Self {
        Self::with_edge(wait, false)
    }

    fn with_edge(wait: Duration, leading: bool) -> Self {
        Self {
            wait,
            leading,
            deadline: None,
            pending: None,
        }
    }

    /// Registers a call. Returns the value right away when it opens a burst
    /// on a leading debouncer.
    pub fn call(&mut self, now: Instant, value: T) -> Option<T> {
        let opens_burst = self.deadline.is_none();
        self.deadline = Some(now + self.wait);

        if opens_burst && self.leading {
            self.pending = None;
            return Some(value);
        }
        self.pending = Some(value);
        None
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Closes the burst if its quiet period has passed, returning the
    /// trailing value if there is one.
    pub fn poll_expired(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drops the burst and any value waiting in it.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
