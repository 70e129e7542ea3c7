//! Catalog and order resources managed from the dashboard.
//!
//! Each backend collection under `/admin/...` is described once by a type
//! implementing [`AdminResource`]. The generic handlers in
//! [`crate::routes::resources`] and the generic client calls in
//! [`crate::api::BackendClient`] do the rest.
//!
//! | Resource     | List | Create/Edit | Delete | Other               |
//! |--------------|------|-------------|--------|---------------------|
//! | `Products`   | yes  | yes         | yes    |                     |
//! | `Categories` | yes  | yes         | yes    |                     |
//! | `Banners`    | yes  | yes         | yes    |                     |
//! | `Reviews`    | yes  | no          | yes    |                     |
//! | `Orders`     | yes  | no          | no     | detail, status      |

mod banners;
mod categories;
mod orders;
mod products;
mod reviews;

pub use banners::Banners;
pub use categories::Categories;
pub use orders::Orders;
pub use products::Products;
pub use reviews::Reviews;

use std::fmt::Display;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::components::{DataTable, FormField, FormValues};

/// A collection the backend exposes at `/admin/{PATH}`.
pub trait AdminResource: Send + Sync + 'static {
    /// Path parameter type, one of the core id newtypes.
    type Id: Copy + Display + DeserializeOwned + Send + Sync + 'static;
    /// Record the backend returns.
    type Record: DeserializeOwned + Send + 'static;

    /// URL segment on both the backend and the dashboard.
    const PATH: &'static str;
    const SINGULAR: &'static str;
    const PLURAL: &'static str;
    /// Header labels for the list table.
    const COLUMNS: &'static [&'static str];
    /// Whether the list links to create and edit forms.
    const EDITABLE: bool = false;

    fn id(record: &Self::Record) -> Self::Id;

    /// One display string per entry of [`Self::COLUMNS`].
    fn cells(record: &Self::Record) -> Vec<String>;

    /// The list page table.
    #[must_use]
    fn table(records: &[Self::Record]) -> DataTable {
        let mut table = DataTable::new(Self::COLUMNS);
        for record in records {
            table.push(Self::id(record), Self::cells(record));
        }
        table
    }
}

/// A resource the dashboard can create and edit.
pub trait EditableResource: AdminResource {
    /// Body sent on create and update.
    type Input: Serialize + Send + Sync;

    /// Prefill values for the edit form.
    fn values(record: &Self::Record) -> FormValues;

    /// Fields of the form, filled from `values`.
    fn fields(values: &FormValues) -> Vec<FormField>;

    /// Validate a submission.
    ///
    /// # Errors
    ///
    /// Returns every problem found, in field order.
    fn parse(values: &FormValues) -> Result<Self::Input, Vec<String>>;
}

/// Turn a display string into a slug: lowercase ASCII words joined by `-`.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug from the form, or derived from `source` when left blank.
fn slug_or_derived(values: &FormValues, source: &str) -> String {
    match values.get("slug") {
        "" => slugify(source),
        slug => slugify(slug),
    }
}

/// Shorten long text for a table cell.
fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Darjeeling First Flush (100g)"), "darjeeling-first-flush-100g");
        assert_eq!(slugify("  --  "), "");
    }

    #[test]
    fn test_slug_falls_back_to_name() {
        let values = FormValues::new().with("slug", "");
        assert_eq!(slug_or_derived(&values, "Cold Pressed Oil"), "cold-pressed-oil");
        let values = values.with("slug", "Oil 1L");
        assert_eq!(slug_or_derived(&values, "Cold Pressed Oil"), "oil-1l");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("abcdefghij-klm", 10), "abcdefghij…");
    }
}
