//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from the access token.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous requests are allowed.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireSeller`] -- Requires `seller` or `admin` role.
//! - [`rbac::RequireAuth`] -- Requires any authenticated user.

pub mod auth;
pub mod rbac;
