//! Saved shipping addresses.

use serde::{Deserialize, Serialize};

use crate::types::AddressId;

/// A shipping address saved on the shopper's account.
///
/// At most one address per user is primary. The backend enforces that; the
/// storefront only displays the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: AddressId,
    #[serde(flatten)]
    pub fields: AddressInput,
    #[serde(default)]
    pub is_primary: bool,
}

impl ShippingAddress {
    /// One-line rendering for lists and the review step.
    #[must_use]
    pub fn one_line(&self) -> String {
        self.fields.one_line()
    }
}

/// Address fields as typed into a form or sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressInput {
    /// Names of required fields that are blank after trimming.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("phone", &self.phone),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Copy with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            address_line1: self.address_line1.trim().to_owned(),
            address_line2: self.address_line2.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.full_name(), self.address_line1.clone()];
        if !self.address_line2.is_empty() {
            parts.push(self.address_line2.clone());
        }
        parts.push(format!("{}, {} {}", self.city, self.state, self.postal_code));
        parts.push(self.country.clone());
        parts.join(", ")
    }
}
