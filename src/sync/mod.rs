//! Viewport-driven synchronization of live vehicles and stops.
//!
//! [`engine`] decides what to fetch and when, [`runtime`] carries those
//! decisions out against an [`endpoints::MapApi`], and [`snapshot`] is what
//! the presentation layer reads back.

pub mod domain;
pub mod endpoints;
pub mod engine;
pub mod journey;
pub mod runtime;
pub mod snapshot;

pub use engine::SyncEngine;
pub use runtime::{SyncController, SyncHandle};
pub use snapshot::{MapSnapshot, VehicleRendering};
