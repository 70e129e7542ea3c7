//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS class for an order status badge.
///
/// Usage in templates: `<span class="{{ order.status|status_class }}">`
#[askama::filter_fn]
pub fn status_class(status: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(badge_class(&status.to_string()))
}

fn badge_class(status: &str) -> String {
    let modifier = match status {
        "pending" | "processing" | "shipped" | "delivered" | "cancelled" => status,
        _ => "unknown",
    };
    format!("badge badge--{modifier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_class() {
        assert_eq!(badge_class("shipped"), "badge badge--shipped");
        assert_eq!(badge_class("<script>"), "badge badge--unknown");
    }
}
