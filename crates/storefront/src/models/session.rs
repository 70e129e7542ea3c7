//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, User, UserId, UserRole};

use crate::api::AuthToken;

/// Session-stored shopper identity.
///
/// Carries the backend token so handlers can call the backend on the
/// shopper's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub token: AuthToken,
}

impl CurrentUser {
    #[must_use]
    pub fn new(user: User, token: AuthToken) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }

    /// First word of the name, for the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in shopper.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the in-progress checkout wizard.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the start time of an in-flight cart mutation.
    pub const CART_PENDING: &str = "cart_pending";

    /// Key for queued flash messages.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let user: User = serde_json::from_str(
            r#"{"id": 3, "name": "Asha  Rao", "email": "asha@example.in"}"#,
        )
        .unwrap();
        let current = CurrentUser::new(user, AuthToken::new("t".to_string()));
        assert_eq!(current.first_name(), "Asha");
        assert_eq!(current.role, UserRole::Customer);
    }
}
