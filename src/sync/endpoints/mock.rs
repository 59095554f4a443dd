use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::sync::domain::{Bounds, EntityClass, EntityCollection, PerClass, Vehicle};
use crate::sync::endpoints::api::{ApiFuture, FetchError, MapApi};
use crate::sync::journey::Journey;

type Outcome = Result<EntityCollection, FetchError>;

enum Scripted {
    Ready(Outcome),
    /// Resolves when the test sends through the paired sender.
    Gated(oneshot::Receiver<Outcome>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFetch {
    pub class: EntityClass,
    pub bounds: Bounds,
    pub at: Instant,
}

#[derive(Default)]
struct MockState {
    scripted: PerClass<VecDeque<Scripted>>,
    fetches: Vec<RecordedFetch>,
    vehicle_answers: VecDeque<Result<Option<Vehicle>, FetchError>>,
    vehicle_requests: Vec<(u64, Instant)>,
    journeys: HashMap<u64, Journey>,
}

/// Scripted in-memory endpoints for tests.
///
/// Unscripted fetches succeed with an empty collection; unscripted vehicle
/// lookups answer `None`.
#[derive(Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ready(&self, class: EntityClass, outcome: Outcome) {
        self.state.lock().unwrap().scripted[class].push_back(Scripted::Ready(outcome));
    }

    /// Scripts the next `class` fetch to hang until the returned sender is
    /// used (or dropped, which fails the fetch).
    pub fn push_gated(&self, class: EntityClass) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().scripted[class].push_back(Scripted::Gated(rx));
        tx
    }

    pub fn push_vehicle(&self, answer: Result<Option<Vehicle>, FetchError>) {
        self.state.lock().unwrap().vehicle_answers.push_back(answer);
    }

    pub fn set_journey(&self, id: u64, journey: Journey) {
        self.state.lock().unwrap().journeys.insert(id, journey);
    }

    pub fn fetches(&self) -> Vec<RecordedFetch> {
        self.state.lock().unwrap().fetches.clone()
    }

    pub fn fetches_of(&self, class: EntityClass) -> Vec<RecordedFetch> {
        self.fetches().into_iter().filter(|f| f.class == class).collect()
    }

    pub fn vehicle_requests(&self) -> Vec<(u64, Instant)> {
        self.state.lock().unwrap().vehicle_requests.clone()
    }
}

impl MapApi for MockApi {
    fn fetch(&self, class: EntityClass, bounds: Bounds) -> ApiFuture<EntityCollection> {
        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.fetches.push(RecordedFetch {
                class,
                bounds,
                at: Instant::now(),
            });
            state.scripted[class].pop_front()
        };

        async move {
            match scripted {
                Some(Scripted::Ready(outcome)) => outcome,
                Some(Scripted::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Transport("gate dropped".into()))),
                None => Ok(match class {
                    EntityClass::Vehicles => EntityCollection::Vehicles(Vec::new()),
                    EntityClass::Stops => EntityCollection::Stops(Vec::new()),
                }),
            }
        }
        .boxed()
    }

    fn fetch_vehicle(&self, id: u64) -> ApiFuture<Option<Vehicle>> {
        let answer = {
            let mut state = self.state.lock().unwrap();
            state.vehicle_requests.push((id, Instant::now()));
            state.vehicle_answers.pop_front().unwrap_or(Ok(None))
        };
        async move { answer }.boxed()
    }

    fn fetch_journey(&self, id: u64) -> ApiFuture<Journey> {
        let journey = self.state.lock().unwrap().journeys.get(&id).cloned();
        async move { journey.ok_or(FetchError::Status(404)) }.boxed()
    }
}
