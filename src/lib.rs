//! Formula-ledger engine for a spreadsheet-backed household ledger
//!
//! One spreadsheet per fiscal year, one sheet per month, one column per day,
//! one row per category. Each cell accumulates its transactions as a growing
//! arithmetic expression so the spreadsheet keeps displaying the running
//! daily total; this crate owns the arithmetic around that convention:
//! mutating the formulas, expanding them back into individual transactions,
//! and reconciling the recovered history with locally kept logs.
//!
//! The remote spreadsheet client is not part of the crate; it plugs into the
//! [`sheet::SheetStore`] trait.

pub mod expr;
pub mod history;
pub mod ledger;
pub mod logging;
pub mod sheet;
pub mod util;

pub use expr::{evaluate, expand};
pub use ledger::{Expense, Ledger, LedgerError};
pub use sheet::{CellRef, CellValue, ColumnRange, SheetStore, StoreError};
pub use util::config::BookConfig;
pub use util::date::{Date, Month};
pub use util::entry::{Amount, Record};
