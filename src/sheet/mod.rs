//! The spreadsheet seen from the engine's side
//!
//! The remote client is not implemented here; `SheetStore` is the seam it
//! plugs into. Everything in this module operates on values already fetched
//! from (or about to be written to) the store, so the engine itself performs
//! no I/O and holds no locks. Callers must treat every mutation as
//! read-modify-write: re-read the cell, compute the new text, write it back,
//! and never keep two mutations of the same cell in flight.

pub mod cell;
pub mod memo;

use std::fmt;

pub use cell::CellValue;

/// Address of a single cell: sheet name, column letters, 1-based row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub sheet: String,
    pub col: String,
    pub row: u32,
}

impl CellRef {
    pub fn new<S, C>(sheet: S, col: C, row: u32) -> Self
    where
        S: ToString,
        C: ToString,
    {
        Self {
            sheet: sheet.to_string(),
            col: col.to_string(),
            row,
        }
    }

    /// Same column, different row
    pub fn at_row(&self, row: u32) -> Self {
        Self {
            sheet: self.sheet.clone(),
            col: self.col.clone(),
            row,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}{}", self.sheet, self.col, self.row)
    }
}

/// A contiguous run of rows in one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRange {
    pub sheet: String,
    pub col: String,
    /// first row, inclusive
    pub row_start: u32,
    /// last row, inclusive
    pub row_end: u32,
}

impl ColumnRange {
    pub fn new<S, C>(sheet: S, col: C, row_start: u32, row_end: u32) -> Self
    where
        S: ToString,
        C: ToString,
    {
        Self {
            sheet: sheet.to_string(),
            col: col.to_string(),
            row_start,
            row_end,
        }
    }

    pub fn len(&self) -> usize {
        (self.row_end + 1 - self.row_start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.row_end < self.row_start
    }
}

impl fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!{}{}:{}{}",
            self.sheet, self.col, self.row_start, self.col, self.row_end,
        )
    }
}

/// A failure reported by the storage backend
///
/// The engine treats these as opaque; retrying is the caller's decision.
#[derive(Debug, Clone)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage backend failure: {}", self.0)
    }
}

/// What the engine consumes from the remote spreadsheet client
///
/// Cells are read in formula form: a cell displaying `320` but holding
/// `=120+200` must come back as `Text("=120+200")`.
pub trait SheetStore {
    fn read_cell(&self, cell: &CellRef) -> Result<CellValue, StoreError>;
    fn write_cell(&mut self, cell: &CellRef, value: &CellValue) -> Result<(), StoreError>;
    fn read_range(&self, range: &ColumnRange) -> Result<Vec<CellValue>, StoreError>;
    /// Locate the cell holding `content` in `sheet` (used to find the header
    /// of a day column)
    fn find_cell(&self, sheet: &str, content: &str) -> Result<Option<CellRef>, StoreError>;
}
