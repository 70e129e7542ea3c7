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

/// Renders an average rating as five stars, rounded to the nearest star.
///
/// Usage in templates: `{{ product.rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(rating.to_string().parse::<f32>().unwrap_or(0.0)))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn star_string(rating: f32) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_string() {
        assert_eq!(star_string(0.0), "☆☆☆☆☆");
        assert_eq!(star_string(3.6), "★★★★☆");
        assert_eq!(star_string(9.0), "★★★★★");
        assert_eq!(star_string(-1.0), "☆☆☆☆☆");
    }
}
