use std::collections::HashMap;

use umya_spreadsheet::Worksheet;

/// Column name → 1-based column index, read from the header row.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<String, u32>,
}

impl HeaderMap {
    /// Reads every non-empty cell of `header_row`. A repeated name maps to
    /// its right-most column.
    pub fn from_sheet(sheet: &Worksheet, header_row: u32) -> Self {
        let columns = (1..=sheet.get_highest_column())
            .filter_map(|col| {
                let name = super::cell_text(sheet, col, header_row);
                (!name.is_empty()).then_some((name, col))
            })
            .collect();
        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<u32> {
        self.columns.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
