pub mod auth;
pub mod cart;
pub mod categories;
pub mod footer;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod returns;
pub mod upload;
pub mod users;
pub mod variants;
pub mod wishlist;
