//! Well-known role names and the [`Role`] enum.
//!
//! The string constants must match the `CHECK` constraint on `users.role`
//! in `20260301000001_create_users.sql`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_BUYER: &str = "buyer";

/// A user's role on the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Buyer => ROLE_BUYER,
            Role::Seller => ROLE_SELLER,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Parse a stored role name.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            ROLE_BUYER => Ok(Role::Buyer),
            ROLE_SELLER => Ok(Role::Seller),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }

    /// Roles a visitor may pick for themselves at registration.
    pub fn is_self_assignable(self) -> bool {
        matches!(self, Role::Buyer | Role::Seller)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_roles() {
        for role in [Role::Buyer, Role::Seller, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(Role::parse("superuser").is_err());
        assert!(Role::parse("Admin").is_err());
    }

    #[test]
    fn admin_is_not_self_assignable() {
        assert!(Role::Buyer.is_self_assignable());
        assert!(Role::Seller.is_self_assignable());
        assert!(!Role::Admin.is_self_assignable());
    }
}
