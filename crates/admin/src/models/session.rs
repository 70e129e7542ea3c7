//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, User, UserId, UserRole};

use crate::api::AuthToken;

/// Session-stored admin identity.
///
/// Whoever logs in is stored here, admin or not; [`Self::is_admin`] is
/// checked on every protected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    /// Backend token forwarded as a cookie.
    pub token: AuthToken,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(user: User, token: AuthToken) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            token,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for queued flash messages.
    pub const FLASH: &str = "flash";
}
