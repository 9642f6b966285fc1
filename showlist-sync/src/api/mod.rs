//! Read-only HTTP API

pub mod events;
pub mod health;

pub use events::event_routes;
pub use health::health_routes;
