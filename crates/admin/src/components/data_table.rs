//! Data table component types.
//!
//! Every admin list page renders the same table: a header row from static
//! column labels and one row of preformatted cells per record.

/// A rendered table.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<TableRow>,
}

/// One record in a table.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// Record id, used to build edit, detail and delete links.
    pub id: String,
    pub cells: Vec<String>,
}

impl DataTable {
    #[must_use]
    pub fn new(columns: &[&'static str]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// Short rows are padded with empty cells so the table stays
    /// rectangular.
    pub fn push(&mut self, id: impl ToString, mut cells: Vec<String>) {
        if cells.len() < self.columns.len() {
            cells.resize(self.columns.len(), String::new());
        }
        self.rows.push(TableRow {
            id: id.to_string(),
            cells,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_padded_to_column_count() {
        let mut table = DataTable::new(&["Name", "Slug", "Price"]);
        assert!(table.is_empty());
        table.push(7, vec!["Masala Chai".to_string()]);
        assert_eq!(table.rows[0].id, "7");
        assert_eq!(table.rows[0].cells, vec!["Masala Chai", "", ""]);
    }
}
