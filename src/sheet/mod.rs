//! Appending scraped products to the xlsx import sheet.
//!
//! Rows already in the sheet are never touched; new rows go below the last
//! row holding any value, aligned to the header row by column name.

mod header;

use std::ops::Range;
use std::path::PathBuf;

use eyre::{eyre, Result, WrapErr};
use tracing::{debug, info, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

pub use header::HeaderMap;

use crate::product_details::{ProductRecord, COLUMNS};

/// Row (1-based) holding the column names in the import template.
pub const DEFAULT_HEADER_ROW: u32 = 2;

/// Where records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub path: PathBuf,
    pub header_row: u32,
}

impl SheetTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header_row: DEFAULT_HEADER_ROW,
        }
    }
}

/// The import workbook; records land on its first worksheet.
pub struct Workbook {
    target: SheetTarget,
    book: Spreadsheet,
    headers: HeaderMap,
}

impl Workbook {
    /// Loads the workbook, or starts a blank one carrying the default
    /// columns when the file does not exist yet.
    pub fn open(target: SheetTarget) -> Result<Self> {
        let book = if target.path.exists() {
            let book = umya_spreadsheet::reader::xlsx::read(&target.path)
                .wrap_err_with(|| format!("Failed to read {}", target.path.display()))?;
            info!(path = %target.path.display(), "Existing workbook loaded");
            book
        } else {
            info!(path = %target.path.display(), "Workbook not found; a new one will be created");
            blank(target.header_row)
        };
        Self::from_spreadsheet(target, book)
    }

    pub fn from_spreadsheet(target: SheetTarget, book: Spreadsheet) -> Result<Self> {
        let sheet = book
            .get_sheet(&0)
            .ok_or_else(|| eyre!("{} has no worksheet", target.path.display()))?;
        let headers = HeaderMap::from_sheet(sheet, target.header_row);
        if headers.is_empty() {
            warn!(row = target.header_row, "Header row is empty; no values will be written");
        } else {
            debug!(columns = headers.len(), row = target.header_row, "Header row mapped");
        }
        Ok(Self {
            target,
            book,
            headers,
        })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }

    /// Last row with any non-empty cell, `0` for an empty sheet.
    pub fn last_non_empty_row(&self) -> u32 {
        self.sheet().map(last_non_empty_row).unwrap_or(0)
    }

    /// Writes `records` below the last non-empty row and returns the rows
    /// used.
    pub fn append(&mut self, records: &[ProductRecord]) -> Result<Range<u32>> {
        let first = self.last_non_empty_row() + 1;
        for (offset, record) in (0u32..).zip(records) {
            self.write_row(first + offset, record.columns())?;
        }
        let rows = first..first + records.len() as u32;
        info!(count = records.len(), first_row = rows.start, "Appended records");
        Ok(rows)
    }

    /// Writes the named values into `row`. Names without a header column and
    /// empty values are skipped; returns how many cells were written.
    pub fn write_row<'a>(
        &mut self,
        row: u32,
        cells: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
    ) -> Result<usize> {
        let headers = &self.headers;
        let sheet = self
            .book
            .get_sheet_mut(&0)
            .ok_or_else(|| eyre!("Workbook has no worksheet"))?;

        let mut written = 0;
        for (name, value) in cells {
            let (Some(col), Some(value)) = (headers.column(name), value) else {
                continue;
            };
            sheet.get_cell_mut((col, row)).set_value_string(value);
            written += 1;
        }
        Ok(written)
    }

    /// Saves the workbook back to its path.
    pub fn save(&self) -> Result<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.target.path)
            .wrap_err_with(|| format!("Failed to write {}", self.target.path.display()))?;
        info!(path = %self.target.path.display(), "Workbook saved");
        Ok(())
    }

    fn sheet(&self) -> Option<&Worksheet> {
        self.book.get_sheet(&0)
    }
}

fn blank(header_row: u32) -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();
    if let Some(sheet) = book.get_sheet_mut(&0) {
        for (col, name) in (1u32..).zip(COLUMNS) {
            sheet.get_cell_mut((col, header_row)).set_value_string(name);
        }
    }
    book
}

fn last_non_empty_row(sheet: &Worksheet) -> u32 {
    let highest_column = sheet.get_highest_column();
    (1..=sheet.get_highest_row())
        .rev()
        .find(|&row| (1..=highest_column).any(|col| cell_in_use(sheet, col, row)))
        .unwrap_or(0)
}

/// A cell holding a formula counts as used even without a cached value.
fn cell_in_use(sheet: &Worksheet, col: u32, row: u32) -> bool {
    sheet
        .get_cell((col, row))
        .is_some_and(|cell| cell.is_formula() || !cell.get_value().is_empty())
}

fn cell_text(sheet: &Worksheet, col: u32, row: u32) -> String {
    sheet
        .get_cell((col, row))
        .map(|cell| cell.get_value().into_owned())
        .unwrap_or_default()
}
