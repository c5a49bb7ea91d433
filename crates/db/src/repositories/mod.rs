//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Methods that must share a
//! transaction take `&mut PgConnection` instead.

pub mod cart_repo;
pub mod category_repo;
pub mod footer_repo;
pub mod notification_repo;
pub mod order_repo;
pub mod product_repo;
pub mod return_repo;
pub mod session_repo;
pub mod user_repo;
pub mod variant_repo;
pub mod wishlist_repo;

pub use cart_repo::CartRepo;
pub use category_repo::CategoryRepo;
pub use footer_repo::FooterRepo;
pub use notification_repo::NotificationRepo;
pub use order_repo::OrderRepo;
pub use product_repo::ProductRepo;
pub use return_repo::ReturnRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
pub use variant_repo::VariantRepo;
pub use wishlist_repo::WishlistRepo;
