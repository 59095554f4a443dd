use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::sync::domain::{Bounds, EntityClass, EntityCollection, Vehicle};
use crate::sync::journey::Journey;

/// Why a fetch produced no data. The engine treats every variant the same
/// way: stale data stays, the loading flag clears.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Owned future returned by [`MapApi`] calls, so it can be moved into a
/// spawned task and aborted there.
pub type ApiFuture<T> = BoxFuture<'static, Result<T, FetchError>>;

/// The HTTP data endpoints used by the map.
///
/// Implementations must be `Send + Sync` for use across tasks. Dropping a
/// returned future abandons the request.
pub trait MapApi: Send + Sync + 'static {
    /// Entities of `class` inside `bounds`.
    fn fetch(&self, class: EntityClass, bounds: Bounds) -> ApiFuture<EntityCollection>;

    /// Current position of one vehicle; `Ok(None)` once it is no longer
    /// tracked.
    fn fetch_vehicle(&self, id: u64) -> ApiFuture<Option<Vehicle>>;

    /// Full detail of one journey.
    fn fetch_journey(&self, id: u64) -> ApiFuture<Journey>;
}
