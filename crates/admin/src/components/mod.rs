//! Reusable view components shared by the admin pages.

pub mod data_table;
pub mod form;

pub use data_table::{DataTable, TableRow};
pub use form::{FieldKind, FormField, FormValues};
