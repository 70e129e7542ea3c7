//! Form component types.
//!
//! Admin forms post flat `name=value` pairs. [`FormValues`] holds them
//! between the request and the re-rendered form, so a rejected submission
//! comes back exactly as typed.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;

/// Input widget for a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Number,
    Url,
    Checkbox,
}

/// A single field ready to render.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
    /// Extra line shown under the input.
    pub hint: Option<&'static str>,
}

impl FormField {
    fn new(kind: FieldKind, name: &'static str, label: &'static str, values: &FormValues) -> Self {
        Self {
            name,
            label,
            kind,
            value: values.get(name).to_string(),
            required: false,
            hint: None,
        }
    }

    #[must_use]
    pub fn text(name: &'static str, label: &'static str, values: &FormValues) -> Self {
        Self::new(FieldKind::Text, name, label, values)
    }

    #[must_use]
    pub fn textarea(name: &'static str, label: &'static str, values: &FormValues) -> Self {
        Self::new(FieldKind::TextArea, name, label, values)
    }

    #[must_use]
    pub fn number(name: &'static str, label: &'static str, values: &FormValues) -> Self {
        Self::new(FieldKind::Number, name, label, values)
    }

    #[must_use]
    pub fn url(name: &'static str, label: &'static str, values: &FormValues) -> Self {
        Self::new(FieldKind::Url, name, label, values)
    }

    #[must_use]
    pub fn checkbox(name: &'static str, label: &'static str, values: &FormValues) -> Self {
        Self::new(FieldKind::Checkbox, name, label, values)
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    /// HTML `type` attribute for single-line inputs.
    #[must_use]
    pub const fn input_type(&self) -> &'static str {
        match self.kind {
            FieldKind::Number => "number",
            FieldKind::Url => "url",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Text | FieldKind::TextArea => "text",
        }
    }

    #[must_use]
    pub fn is_textarea(&self) -> bool {
        self.kind == FieldKind::TextArea
    }

    #[must_use]
    pub fn is_checkbox(&self) -> bool {
        self.kind == FieldKind::Checkbox
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Submitted (or prefilled) form values keyed by field name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FormValues(HashMap<String, String>);

impl FormValues {
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Set a value, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    /// Set a checkbox: checked is stored as `"on"`, unchecked as absent.
    #[must_use]
    pub fn with_flag(mut self, name: &str, checked: bool) -> Self {
        if checked {
            self.0.insert(name.to_string(), "on".to_string());
        } else {
            self.0.remove(name);
        }
        self
    }

    /// Trimmed value, empty when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map_or("", |value| value.trim())
    }

    /// Unchecked checkboxes are not submitted at all.
    #[must_use]
    pub fn is_checked(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// Non-empty lines of a textarea.
    #[must_use]
    pub fn lines(&self, name: &str) -> Vec<String> {
        self.get(name)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// A value that must be present.
    pub fn required(&self, name: &str, label: &str, errors: &mut Vec<String>) -> String {
        let value = self.get(name);
        if value.is_empty() {
            errors.push(format!("{label} is required."));
        }
        value.to_string()
    }

    /// A value that must be present and parse as `T`.
    pub fn parsed<T: FromStr>(
        &self,
        name: &str,
        label: &str,
        errors: &mut Vec<String>,
    ) -> Option<T> {
        let value = self.get(name);
        if value.is_empty() {
            errors.push(format!("{label} is required."));
            return None;
        }
        Self::parse_or_report(value, label, errors)
    }

    /// A value that may be blank but must parse as `T` when given.
    pub fn optional<T: FromStr>(
        &self,
        name: &str,
        label: &str,
        errors: &mut Vec<String>,
    ) -> Option<T> {
        match self.get(name) {
            "" => None,
            value => Self::parse_or_report(value, label, errors),
        }
    }

    fn parse_or_report<T: FromStr>(
        value: &str,
        label: &str,
        errors: &mut Vec<String>,
    ) -> Option<T> {
        value.parse().ok().or_else(|| {
            errors.push(format!("{label} is not valid."));
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_trimmed() {
        let values = FormValues::new().with("name", "  Jaggery  ");
        assert_eq!(values.get("name"), "Jaggery");
        assert_eq!(values.get("missing"), "");
    }

    #[test]
    fn test_required_and_parsed_collect_errors() {
        let values = FormValues::new().with("stock", "ten").with("price", "");
        let mut errors = Vec::new();
        let name = values.required("name", "Name", &mut errors);
        let stock: Option<u32> = values.parsed("stock", "Stock", &mut errors);
        let price: Option<u32> = values.parsed("price", "Price", &mut errors);
        assert!(name.is_empty());
        assert_eq!((stock, price), (None, None));
        assert_eq!(
            errors,
            vec!["Name is required.", "Stock is not valid.", "Price is required."]
        );
    }

    #[test]
    fn test_optional_allows_blank() {
        let values = FormValues::new().with("category_id", " ");
        let mut errors = Vec::new();
        let category: Option<i64> = values.optional("category_id", "Category", &mut errors);
        assert_eq!(category, None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_lines_and_flags() {
        let values = FormValues::new()
            .with("images", "https://cdn.in/a.jpg\n\n  https://cdn.in/b.jpg \n")
            .with_flag("active", true);
        assert_eq!(
            values.lines("images"),
            vec!["https://cdn.in/a.jpg", "https://cdn.in/b.jpg"]
        );
        assert!(values.is_checked("active"));
        assert!(!values.with_flag("active", false).is_checked("active"));
    }

    #[test]
    fn test_field_takes_value_from_form() {
        let values = FormValues::new().with("slug", "masala-chai");
        let field = FormField::text("slug", "Slug", &values).required();
        assert_eq!(field.value, "masala-chai");
        assert!(field.required);
        assert_eq!(field.input_type(), "text");
        assert!(!FormField::checkbox("active", "Active", &values).is_checked());
    }
}
