//! Session storage for the checkout wizard.
//!
//! One wizard per session. Starting checkout replaces it; placing the order
//! removes it.

use bazaar_core::{AddressId, CheckoutWizard};
use tower_sessions::Session;

use crate::models::session_keys;

/// Load the wizard, if checkout is in progress.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn load(
    session: &Session,
) -> Result<Option<CheckoutWizard>, tower_sessions::session::Error> {
    session.get(session_keys::CHECKOUT).await
}

/// Store the wizard.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save(
    session: &Session,
    wizard: &CheckoutWizard,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CHECKOUT, wizard).await
}

/// Drop the wizard.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CheckoutWizard>(session_keys::CHECKOUT).await?;
    Ok(())
}

/// A saved address was deleted: let an in-progress wizard clear the
/// shipping form it populated.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn address_removed(
    session: &Session,
    id: AddressId,
) -> Result<(), tower_sessions::session::Error> {
    if let Some(mut wizard) = load(session).await? {
        wizard.address_removed(id);
        save(session, &wizard).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use bazaar_core::{AddressInput, CheckoutMode, CheckoutStep, ShippingAddress};
    use tower_sessions::MemoryStore;

    use super::*;

    fn saved_address(id: i64) -> ShippingAddress {
        ShippingAddress {
            id: AddressId::new(id),
            fields: AddressInput {
                first_name: "Ravi".to_string(),
                last_name: "Kumar".to_string(),
                phone: "9000000001".to_string(),
                address_line1: "4 Park Street".to_string(),
                address_line2: String::new(),
                city: "Kolkata".to_string(),
                state: "West Bengal".to_string(),
                postal_code: "700016".to_string(),
                country: "India".to_string(),
            },
            is_primary: true,
        }
    }

    #[tokio::test]
    async fn test_address_removed_clears_selected_form() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut wizard = CheckoutWizard::new(CheckoutMode::Cart).unwrap();
        wizard.select_address(&saved_address(5)).unwrap();
        save(&session, &wizard).await.unwrap();

        address_removed(&session, AddressId::new(5)).await.unwrap();

        let wizard = load(&session).await.unwrap().unwrap();
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
        assert_eq!(wizard.selected_address(), None);
        assert!(wizard.shipping().first_name.is_empty());
    }

    #[tokio::test]
    async fn test_address_removed_without_wizard() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        address_removed(&session, AddressId::new(1)).await.unwrap();
        assert!(load(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        save(&session, &CheckoutWizard::new(CheckoutMode::Cart).unwrap())
            .await
            .unwrap();
        clear(&session).await.unwrap();
        assert!(load(&session).await.unwrap().is_none());
    }
}
