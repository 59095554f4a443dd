//! Value types shared by the engine, the runtime and the data endpoints.

pub mod entities;
pub mod geo;

pub use entities::{
    EntityClass, EntityCollection, PerClass, Selection, ServiceDetails, Stop, Vehicle,
    VehicleDetails,
};
pub use geo::{extent, Bounds, LngLat, Viewport};
