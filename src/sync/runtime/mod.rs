pub mod controller;
pub mod debounce;

pub use controller::{SyncController, SyncHandle, ViewEvent};
pub use debounce::Debouncer;
