//! Bazaar domain core.
//!
//! Pure business rules shared by the repository layer and the HTTP API:
//! validation, status machines, pricing, and normalisation helpers. Nothing
//! in this crate touches the network or the database.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod footer;
pub mod images;
pub mod impersonation;
pub mod order;
pub mod product;
pub mod returns;
pub mod roles;
pub mod types;
pub mod upload;
pub mod validation;
pub mod variants;
