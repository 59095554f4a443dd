use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::SyncConfig;
use crate::persistence::{PreferenceStore, SavedView};
use crate::sync::domain::{EntityCollection, PerClass, Selection, Viewport};
use crate::sync::endpoints::{FetchError, MapApi};
use crate::sync::engine::{EngineCommand, EngineEvent, SyncEngine, Ticket};
use crate::sync::runtime::debounce::Debouncer;
use crate::sync::snapshot::MapSnapshot;

type Settlement = (Ticket, Result<EntityCollection, FetchError>);

/// A signal from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Load(Viewport),
    Move(Viewport),
    Visibility(bool),
    Select(Selection),
    Teardown,
}

struct InFlightFetch {
    ticket: Ticket,
    task: JoinHandle<()>,
}

/// **SyncController**
///
/// The imperative shell around [`SyncEngine`]. It:
/// 1. Debounces map moves and feeds view signals to the engine.
/// 2. Executes the engine's commands: spawns and aborts fetch tasks, arms
///    the poll deadline and schedules viewport persistence.
/// 3. Publishes a fresh [`MapSnapshot`] after every state change.
///
/// Timers are plain deadlines awaited by [`SyncController::step`], so the
/// controller must be stepped (or [`run`](SyncController::run)) to make
/// progress. Entry points that may spawn fetches must be called from within
/// a tokio runtime.
pub struct SyncController<A> {
    engine: SyncEngine,
    api: A,

    in_flight: PerClass<Option<InFlightFetch>>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    settled_rx: mpsc::UnboundedReceiver<Settlement>,

    move_debounce: Debouncer<Viewport>,
    persist_debounce: Debouncer<Viewport>,
    poll_deadline: Option<Instant>,

    preferences: Option<PreferenceStore>,
    snapshot: watch::Sender<MapSnapshot>,

    /// Start time for logging relative timestamps.
    t0: Instant,
}

impl<A: MapApi> SyncController<A> {
    pub fn new(api: A, config: SyncConfig) -> Self {
        let engine = SyncEngine::new(&config);
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(engine.snapshot());

        Self {
            engine,
            api,
            in_flight: PerClass::default(),
            settled_tx,
            settled_rx,
            move_debounce: Debouncer::leading(config.move_debounce),
            persist_debounce: Debouncer::trailing(config.persist_debounce),
            poll_deadline: None,
            preferences: None,
            snapshot,
            t0: Instant::now(),
        }
    }

    /// Persist the viewport to `store` after each (debounced) move.
    pub fn with_preferences(mut self, store: PreferenceStore) -> Self {
        self.preferences = Some(store);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<MapSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    // ================================
    // Entry points
    // ================================

    pub fn trigger_load(&mut self, viewport: Viewport) {
        self.info("map loaded");
        self.process_engine(EngineEvent::Loaded(viewport));
    }

    /// A raw move-end. The first of a burst goes through at once, the last
    /// one after the burst has been quiet for the debounce window.
    pub fn trigger_move(&mut self, viewport: Viewport) {
        if let Some(viewport) = self.move_debounce.call(Instant::now(), viewport) {
            self.process_engine(EngineEvent::MoveEnd(viewport));
        } else {
            self.trace("move debounced");
        }
    }

    pub fn trigger_visibility_change(&mut self, visible: bool) {
        self.process_engine(EngineEvent::VisibilityChanged { visible });
    }

    pub fn select(&mut self, selection: Selection) {
        self.process_engine(EngineEvent::Select(selection));
    }

    /// Tears the view down: aborts every fetch, stops polling, drops pending
    /// moves and writes out a viewport still waiting to be persisted.
    pub fn teardown(&mut self) {
        self.info("teardown");
        self.move_debounce.cancel();
        self.process_engine(EngineEvent::TornDown);

        if let Some(viewport) = self.persist_debounce.poll_expired(far_future()) {
            self.persist(&viewport);
        }

        // anything left in the channel answers a revoked ticket
        while self.settled_rx.try_recv().is_ok() {}
    }

    pub fn dispatch(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Load(viewport) => self.trigger_load(viewport),
            ViewEvent::Move(viewport) => self.trigger_move(viewport),
            ViewEvent::Visibility(visible) => self.trigger_visibility_change(visible),
            ViewEvent::Select(selection) => self.select(selection),
            ViewEvent::Teardown => self.teardown(),
        }
    }

    // ================================
    // Event loop
    // ================================

    /// Waits for the next settlement or deadline and handles it.
    pub async fn step(&mut self) {
        let move_deadline = self.move_debounce.deadline();
        let poll_deadline = self.poll_deadline;
        let persist_deadline = self.persist_debounce.deadline();

        tokio::select! {
            Some((ticket, result)) = self.settled_rx.recv() => {
                self.on_settled(ticket, result);
            }
            _ = wait_for(move_deadline) => {
                if let Some(viewport) = self.move_debounce.poll_expired(Instant::now()) {
                    self.debug("trailing move");
                    self.process_engine(EngineEvent::MoveEnd(viewport));
                }
            }
            _ = wait_for(poll_deadline) => {
                self.poll_deadline = None;
                self.process_engine(EngineEvent::PollTimerFired);
            }
            _ = wait_for(persist_deadline) => {
                if let Some(viewport) = self.persist_debounce.poll_expired(Instant::now()) {
                    self.persist(&viewport);
                }
            }
        }
    }

    /// No fetch is in flight and no move is waiting on the debounce.
    pub fn is_idle(&self) -> bool {
        self.in_flight.vehicles.is_none()
            && self.in_flight.stops.is_none()
            && self.move_debounce.deadline().is_none()
    }

    /// Steps until [`is_idle`](Self::is_idle). An armed poll timer does not
    /// count as work.
    pub async fn run_until_idle(&mut self) {
        while !self.is_idle() {
            self.step().await;
        }
    }

    /// Runs until `inbox` yields [`ViewEvent::Teardown`] or closes.
    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<ViewEvent>) {
        self.info("starting controller");
        loop {
            tokio::select! {
                event = inbox.recv() => match event {
                    Some(ViewEvent::Teardown) | None => {
                        self.teardown();
                        break;
                    }
                    Some(event) => self.dispatch(event),
                },
                _ = self.step() => {}
            }
        }
        self.info("controller stopped");
    }

    /// Moves the controller onto its own task.
    pub fn spawn(self) -> (SyncHandle, JoinHandle<()>) {
        let (events, inbox) = mpsc::unbounded_channel();
        let handle = SyncHandle {
            events,
            snapshot: self.subscribe(),
        };
        (handle, tokio::spawn(self.run(inbox)))
    }

    // ================================
    // Engine plumbing
    // ================================

    fn on_settled(&mut self, ticket: Ticket, result: Result<EntityCollection, FetchError>) {
        let slot = &mut self.in_flight[ticket.class];
        if slot.as_ref().is_some_and(|f| f.ticket == ticket) {
            *slot = None;
        }
        self.trace(&format!("settled {:?} ok={}", ticket, result.is_ok()));
        self.process_engine(EngineEvent::FetchSettled { ticket, result });
    }

    /// Feeds an event into the engine, executes the resulting commands and
    /// publishes the new state.
    pub fn process_engine(&mut self, event: EngineEvent) {
        self.trace(&format!("engine.handle_event({:?})", event));

        let cmds = self.engine.handle_event(event);
        for cmd in cmds {
            self.execute_command(cmd);
        }

        self.snapshot.send_replace(self.engine.snapshot());
    }

    fn execute_command(&mut self, cmd: EngineCommand) {
        self.trace(&format!("cmd: {:?}", cmd));
        match cmd {
            EngineCommand::CancelFetch(ticket) => {
                let slot = &mut self.in_flight[ticket.class];
                if slot.as_ref().is_some_and(|f| f.ticket == ticket) {
                    if let Some(fetch) = slot.take() {
                        fetch.task.abort();
                    }
                }
            }

            EngineCommand::Fetch { ticket, bounds } => {
                self.debug(&format!("fetch {} {:?}", ticket.class, bounds));
                let request = self.api.fetch(ticket.class, bounds);
                let settled = self.settled_tx.clone();
                let task = tokio::spawn(async move {
                    let result = request.await;
                    // the receiver lives as long as the controller
                    let _ = settled.send((ticket, result));
                });

                let replaced = self.in_flight[ticket.class].replace(InFlightFetch { ticket, task });
                if let Some(old) = replaced {
                    old.task.abort();
                }
            }

            EngineCommand::SchedulePoll(delay) => {
                self.poll_deadline = Some(Instant::now() + delay);
            }

            EngineCommand::CancelPoll => {
                self.poll_deadline = None;
            }

            EngineCommand::PersistView(viewport) => {
                if self.preferences.is_some() {
                    self.persist_debounce.call(Instant::now(), viewport);
                }
            }
        }
    }

    fn persist(&self, viewport: &Viewport) {
        if let Some(store) = &self.preferences {
            let view = SavedView::from_viewport(viewport);
            self.debug(&format!("persisting view {}", view));
            store.save_view(&view);
        }
    }
}

impl<A> SyncController<A> {
    fn t(&self) -> u128 {
        self.t0.elapsed().as_micros()
    }

    fn info(&self, msg: &str) {
        log::info!("[CONTROLLER] {:>8}us: {}", self.t(), msg);
    }

    fn debug(&self, msg: &str) {
        log::debug!("[CONTROLLER] {:>8}us: {}", self.t(), msg);
    }

    fn trace(&self, msg: &str) {
        log::trace!("[CONTROLLER] {:>8}us: {}", self.t(), msg);
    }
}

impl<A> Drop for SyncController<A> {
    fn drop(&mut self) {
        for class in crate::sync::domain::EntityClass::ALL {
            if let Some(fetch) = self.in_flight[class].take() {
                fetch.task.abort();
            }
        }
    }
}

/// Cloneable front door to a spawned [`SyncController`].
///
/// Signals sent after the controller stopped are dropped.
#[derive(Clone)]
pub struct SyncHandle {
    events: mpsc::UnboundedSender<ViewEvent>,
    snapshot: watch::Receiver<MapSnapshot>,
}

impl SyncHandle {
    pub fn trigger_load(&self, viewport: Viewport) {
        self.send(ViewEvent::Load(viewport));
    }

    pub fn trigger_move(&self, viewport: Viewport) {
        self.send(ViewEvent::Move(viewport));
    }

    pub fn trigger_visibility_change(&self, visible: bool) {
        self.send(ViewEvent::Visibility(visible));
    }

    pub fn select(&self, selection: Selection) {
        self.send(ViewEvent::Select(selection));
    }

    pub fn teardown(&self) {
        self.send(ViewEvent::Teardown);
    }

    pub fn snapshot(&self) -> MapSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MapSnapshot> {
        self.snapshot.clone()
    }

    fn send(&self, event: ViewEvent) {
        if self.events.send(event).is_err() {
            log::debug!("[CONTROLLER] signal dropped, controller stopped");
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// A time no deadline can be past, for flushing a debouncer.
fn far_future() -> Instant {
    Instant::now() + std::time::Duration::from_secs(86400 * 365)
}
