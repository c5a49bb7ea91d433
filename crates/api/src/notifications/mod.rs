//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus and stores an
//! in-app notification for every user an event concerns.

pub mod router;

pub use router::NotificationRouter;
