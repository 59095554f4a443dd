//! The HTTP data endpoints the map reads from.

pub mod api;
pub mod http;
#[cfg(test)]
pub mod mock;

pub use api::{ApiFuture, FetchError, MapApi};
pub use http::HttpApi;
#[cfg(test)]
pub use mock::MockApi;

#[cfg(test)]
mod tests;
