//! Per-page layout data.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::auth::current_admin;
use crate::models::CurrentAdmin;
use crate::services::flash::{self, Flash};

/// A sidebar entry.
#[derive(Debug, Clone, Copy)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn item(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

/// Sidebar entries in display order.
pub const NAV: &[NavItem] = &[
    item("Dashboard", "/"),
    item("Products", "/products"),
    item("Categories", "/categories"),
    item("Banners", "/banners"),
    item("Reviews", "/reviews"),
    item("Orders", "/orders"),
];

/// What the admin layout needs on every page.
///
/// Extracting it drains the flash queue.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub admin: Option<CurrentAdmin>,
    pub flashes: Vec<Flash>,
    pub current_path: String,
}

impl Page {
    pub async fn load(session: &Session, current_path: &str) -> Self {
        Self {
            admin: current_admin(session).await,
            flashes: flash::take(session).await,
            current_path: current_path.to_string(),
        }
    }

    /// Whether a sidebar entry should be highlighted.
    #[must_use]
    pub fn is_current(&self, path: &str) -> bool {
        if path == "/" {
            return self.current_path == "/";
        }
        self.current_path == path
            || self
                .current_path
                .strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn nav(&self) -> &'static [NavItem] {
        NAV
    }
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        Ok(match parts.extensions.get::<Session>() {
            Some(session) => Self::load(session, &path).await,
            None => Self {
                current_path: path,
                ..Self::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(path: &str) -> Page {
        Page {
            current_path: path.to_string(),
            ..Page::default()
        }
    }

    #[test]
    fn test_is_current() {
        assert!(at("/").is_current("/"));
        assert!(!at("/products").is_current("/"));
        assert!(at("/products/4/edit").is_current("/products"));
        assert!(!at("/productsx").is_current("/products"));
    }
}
