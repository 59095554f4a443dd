use std::mem;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    /// A timer is armed; the next cycle starts when it fires.
    Scheduled,
    /// A vehicles fetch is in flight.
    Running,
}

/// Refresh cadence of the vehicles class.
///
/// The loop only tracks state; arming and cancelling the actual timer is
/// left to the runtime, driven by the commands the engine emits around
/// these transitions.
#[derive(Debug)]
pub struct PollLoop {
    state: PollState,
    interval: Duration,
}

impl PollLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: PollState::Idle,
            interval,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// A vehicles fetch was issued, whatever triggered it.
    ///
    /// Returns `true` when an armed timer has to be cancelled.
    pub fn begin_cycle(&mut self) -> bool {
        mem::replace(&mut self.state, PollState::Running) == PollState::Scheduled
    }

    /// The live vehicles fetch settled.
    ///
    /// Returns the delay to arm the next timer with, measured from now. A
    /// hidden page gets no timer; the loop waits for visibility to return.
    pub fn cycle_settled(&mut self, visible: bool) -> Option<Duration> {
        if self.state != PollState::Running {
            return None;
        }

        if visible {
            self.state = PollState::Scheduled;
            Some(self.interval)
        } else {
            self.state = PollState::Idle;
            None
        }
    }

    /// The armed timer fired. Returns `true` if a cycle is due; the caller
    /// starts it with [`PollLoop::begin_cycle`] once the fetch is issued.
    pub fn timer_fired(&mut self) -> bool {
        mem::replace(&mut self.state, PollState::Idle) == PollState::Scheduled
    }

    /// Goes idle. Returns `true` when an armed timer has to be cancelled.
    pub fn stop(&mut self) -> bool {
        mem::replace(&mut self.state, PollState::Idle) == PollState::Scheduled
    }
}
