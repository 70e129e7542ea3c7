//! Saved address route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{AddressId, AddressInput, ShippingAddress};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Page;
use crate::services::{self, flash};
use crate::state::AppState;

const ADDRESSES_PATH: &str = "/account/addresses";

/// Address form fields in display order: (name, label, required).
const ADDRESS_FIELDS: [(&str, &str, bool); 9] = [
    ("first_name", "First name", true),
    ("last_name", "Last name", true),
    ("phone", "Phone", true),
    ("address_line1", "Address line 1", true),
    ("address_line2", "Address line 2 (optional)", false),
    ("city", "City", true),
    ("state", "State", true),
    ("postal_code", "Postal code", true),
    ("country", "Country", true),
];

/// One input of an address form.
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub required: bool,
    pub missing: bool,
}

/// Lay out an address as form inputs, flagging the `missing` ones.
pub(crate) fn address_fields(input: &AddressInput, missing: &[&str]) -> Vec<FieldView> {
    let values = [
        &input.first_name,
        &input.last_name,
        &input.phone,
        &input.address_line1,
        &input.address_line2,
        &input.city,
        &input.state,
        &input.postal_code,
        &input.country,
    ];

    ADDRESS_FIELDS
        .iter()
        .zip(values)
        .map(|(&(name, label, required), value)| FieldView {
            name,
            label,
            value: value.clone(),
            required,
            missing: missing.contains(&name),
        })
        .collect()
}

/// Human-readable list of missing field labels.
pub(crate) fn missing_message(missing: &[&str]) -> String {
    let labels: Vec<&str> = ADDRESS_FIELDS
        .iter()
        .filter(|(name, _, _)| missing.contains(name))
        .map(|(_, label, _)| *label)
        .collect();
    format!("Please fill in: {}", labels.join(", "))
}

/// Address list template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub page: Page,
    pub addresses: Vec<ShippingAddress>,
}

/// New or edit address form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/address_form.html")]
pub struct AddressFormTemplate {
    pub page: Page,
    pub heading: &'static str,
    pub action: String,
    pub fields: Vec<FieldView>,
    pub error: Option<String>,
}

impl AddressFormTemplate {
    fn new_address(page: Page, input: &AddressInput, missing: &[&str]) -> Self {
        Self {
            page,
            heading: "New address",
            action: ADDRESSES_PATH.to_string(),
            fields: address_fields(input, missing),
            error: None,
        }
    }

    fn edit_address(page: Page, id: AddressId, input: &AddressInput, missing: &[&str]) -> Self {
        Self {
            page,
            heading: "Edit address",
            action: format!("{ADDRESSES_PATH}/{id}"),
            fields: address_fields(input, missing),
            error: None,
        }
    }

    fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// Display the saved addresses.
#[instrument(skip(state, page, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: Page,
) -> Result<impl IntoResponse> {
    let addresses = state.backend().addresses(&user.token).await?;
    Ok(AddressesTemplate { page, addresses })
}

/// Display the new address form.
pub async fn new(RequireAuth(_user): RequireAuth, page: Page) -> impl IntoResponse {
    AddressFormTemplate::new_address(page, &AddressInput::default(), &[])
}

/// Save a new address.
#[instrument(skip(state, session, user, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(input): Form<AddressInput>,
) -> Result<Response> {
    let missing = input.missing_fields();
    if !missing.is_empty() {
        let page = Page::load(&session).await;
        return Ok(AddressFormTemplate::new_address(page, &input, &missing)
            .with_error(missing_message(&missing))
            .into_response());
    }

    match state
        .backend()
        .create_address(&user.token, &input.trimmed())
        .await
    {
        Ok(_) => {
            flash::success(&session, "Address saved").await?;
            Ok(Redirect::to(ADDRESSES_PATH).into_response())
        }
        Err(ApiError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            let page = Page::load(&session).await;
            Ok(AddressFormTemplate::new_address(page, &input, &[])
                .with_error(e.user_message())
                .into_response())
        }
    }
}

/// Display the edit form for one address.
#[instrument(skip(state, page, user), fields(user_id = %user.id, address_id = %id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    page: Page,
) -> Result<impl IntoResponse> {
    let address = state
        .backend()
        .addresses(&user.token)
        .await?
        .into_iter()
        .find(|address| address.id == id)
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;

    Ok(AddressFormTemplate::edit_address(page, id, &address.fields, &[]))
}

/// Replace a saved address.
#[instrument(skip(state, session, user, input), fields(user_id = %user.id, address_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Form(input): Form<AddressInput>,
) -> Result<Response> {
    let missing = input.missing_fields();
    if !missing.is_empty() {
        let page = Page::load(&session).await;
        return Ok(AddressFormTemplate::edit_address(page, id, &input, &missing)
            .with_error(missing_message(&missing))
            .into_response());
    }

    match state
        .backend()
        .update_address(&user.token, id, &input.trimmed())
        .await
    {
        Ok(_) => {
            flash::success(&session, "Address updated").await?;
            Ok(Redirect::to(ADDRESSES_PATH).into_response())
        }
        Err(ApiError::Unauthorized) => Err(AppError::Unauthorized),
        Err(e) => {
            let page = Page::load(&session).await;
            Ok(AddressFormTemplate::edit_address(page, id, &input, &[])
                .with_error(e.user_message())
                .into_response())
        }
    }
}

/// Delete a saved address.
///
/// An in-progress checkout that had this address selected loses its
/// shipping form along with it.
#[instrument(skip(state, session, user), fields(user_id = %user.id, address_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    let result = state.backend().delete_address(&user.token, id).await;
    if flash::outcome(&session, result, "Address deleted").await?.is_some() {
        services::checkout::address_removed(&session, id).await?;
    }
    Ok(Redirect::to(ADDRESSES_PATH))
}

/// Make a saved address the primary one.
#[instrument(skip(state, session, user), fields(user_id = %user.id, address_id = %id))]
pub async fn make_primary(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    let result = state.backend().make_primary_address(&user.token, id).await;
    flash::outcome(&session, result, "Primary address updated").await?;
    Ok(Redirect::to(ADDRESSES_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            first_name: "Meera".to_string(),
            last_name: "Iyer".to_string(),
            phone: "9123456780".to_string(),
            address_line1: "22 Anna Salai".to_string(),
            address_line2: String::new(),
            city: "Chennai".to_string(),
            state: "Tamil Nadu".to_string(),
            postal_code: "600002".to_string(),
            country: "India".to_string(),
        }
    }

    #[test]
    fn test_address_fields_in_order() {
        let fields = address_fields(&input(), &["city"]);
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0].name, "first_name");
        assert_eq!(fields[0].value, "Meera");
        assert!(!fields[4].required);

        let city = fields.iter().find(|f| f.name == "city").unwrap();
        assert!(city.missing);
        assert_eq!(fields.iter().filter(|f| f.missing).count(), 1);
    }

    #[test]
    fn test_missing_message_uses_labels() {
        assert_eq!(
            missing_message(&["phone", "postal_code"]),
            "Please fill in: Phone, Postal code"
        );
    }

    #[test]
    fn test_form_renders_values_and_errors() {
        let html =
            AddressFormTemplate::edit_address(Page::default(), AddressId::new(3), &input(), &[])
                .with_error("Please fill in: City".to_string())
                .render()
                .unwrap();
        assert!(html.contains("action=\"/account/addresses/3\""));
        assert!(html.contains("value=\"Meera\""));
        assert!(html.contains("Please fill in: City"));
    }

    #[test]
    fn test_list_marks_primary() {
        let html = AddressesTemplate {
            page: Page::default(),
            addresses: vec![ShippingAddress {
                id: AddressId::new(1),
                fields: input(),
                is_primary: true,
            }],
        }
        .render()
        .unwrap();
        assert!(html.contains("Meera Iyer"));
        assert!(html.contains("Primary"));
        assert!(!html.contains("/account/addresses/1/primary"));
    }
}
