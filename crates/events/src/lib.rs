//! Bazaar in-process event bus.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope, with constructors for
//!   each storefront event in [`kinds`].

pub mod bus;
pub mod kinds;

pub use bus::{EventBus, PlatformEvent};
