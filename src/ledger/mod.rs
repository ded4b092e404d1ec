//! Coordination of live ledger operations against the spreadsheet
//!
//! `Ledger` drives the pure pieces (cell mutator, memo allocator, itemizer)
//! through a `SheetStore`. Every mutation is a read-modify-write: the cell
//! is re-read, the new text computed, then written back. The store has no
//! transactions, so callers must serialize mutations to the same cell;
//! transient store failures bubble up for the caller to retry.

use log::{debug, warn};
use std::fmt;

use crate::expr;
use crate::history::itemize::{DayCells, Itemizer};
use crate::util::{
    config::BookConfig,
    date::Date,
    entry::{Amount, Record},
    summary::Summary,
};
use crate::sheet::{
    cell::{self, CellError},
    memo::{MemoError, MemoGroup},
    CellRef, CellValue, ColumnRange, SheetStore, StoreError,
};

/// One expense to register, delete or look for
#[derive(Debug, Clone)]
pub struct Expense {
    pub date: Date,
    pub category: String,
    pub amount: Amount,
    pub memo: String,
}

impl Expense {
    pub fn new<C, M>(date: Date, category: C, amount: Amount, memo: M) -> Self
    where
        C: ToString,
        M: ToString,
    {
        Self {
            date,
            category: category.to_string(),
            amount,
            memo: memo.to_string(),
        }
    }
}

/// Failure of a ledger operation
#[derive(Debug)]
pub enum LedgerError {
    /// the storage backend failed; retrying is up to the caller
    Store(StoreError),
    /// no column headed by this date exists in the book
    DayNotFound(Date),
    /// the category is not in the configured list
    UnknownCategory(String),
    /// the target amount is not recorded in the cell
    Cell(CellError),
    /// memo slot pool failure (full, or memo absent)
    Memo(MemoError),
    /// an edit that changes nothing
    Unchanged,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LedgerError::*;
        match self {
            Store(e) => write!(f, "{}", e),
            DayNotFound(d) => write!(f, "no column for {} in the book", d),
            UnknownCategory(c) => write!(f, "'{}' is not a configured category", c),
            Cell(e) => write!(f, "{}", e),
            Memo(e) => write!(f, "{}", e),
            Unchanged => write!(f, "nothing to do"),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::Store(e)
    }
}

impl From<CellError> for LedgerError {
    fn from(e: CellError) -> Self {
        LedgerError::Cell(e)
    }
}

impl From<MemoError> for LedgerError {
    fn from(e: MemoError) -> Self {
        LedgerError::Memo(e)
    }
}

pub struct Ledger<S: SheetStore> {
    store: S,
    config: BookConfig,
}

impl<S: SheetStore> Ledger<S> {
    pub fn new(store: S, config: BookConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Header cell of the day column for `date`
    fn day_column(&self, date: Date) -> Result<CellRef, LedgerError> {
        let sheet = date.sheet_name();
        match self.store.find_cell(&sheet, &date.column_key())? {
            Some(header) => Ok(header),
            None => Err(LedgerError::DayNotFound(date)),
        }
    }

    /// Amount cell of (category, day)
    fn amount_cell(&self, column: &CellRef, category: &str) -> Result<CellRef, LedgerError> {
        let row = self
            .config
            .amount_row_of(category)
            .ok_or_else(|| LedgerError::UnknownCategory(category.to_string()))?;
        Ok(column.at_row(row))
    }

    fn memo_range(&self, column: &CellRef) -> ColumnRange {
        ColumnRange::new(
            &column.sheet,
            &column.col,
            self.config.memo_row,
            self.config.memo_row + self.config.memo_slots as u32 - 1,
        )
    }

    fn read_memo_group(&self, column: &CellRef) -> Result<MemoGroup, LedgerError> {
        let values = self.store.read_range(&self.memo_range(column))?;
        Ok(MemoGroup::new(values.iter().map(|v| v.raw()).collect()))
    }

    fn write_memo_slot(&mut self, column: &CellRef, index: usize, value: String) -> Result<(), LedgerError> {
        let cell = column.at_row(self.config.memo_row + index as u32);
        debug!("writing memo slot '{}' to {}", value, cell);
        self.store.write_cell(&cell, &CellValue::Text(value))?;
        Ok(())
    }

    /// Record one expense: append the amount, then file the memo
    ///
    /// The amount lands even when the memo pool is full; the overflow is
    /// still reported so the caller can surface it.
    pub fn register(&mut self, expense: &Expense) -> Result<(), LedgerError> {
        let column = self.day_column(expense.date)?;
        let cell = self.amount_cell(&column, &expense.category)?;
        let current = self.store.read_cell(&cell)?;
        let next = cell::add(&current, expense.amount);
        debug!("writing '{}' to {} (was '{}')", next, cell, current);
        self.store.write_cell(&cell, &next)?;
        if !expense.memo.is_empty() {
            let group = self.read_memo_group(&column)?;
            let write = group.add(&expense.category, &expense.memo)?;
            self.write_memo_slot(&column, write.index, write.value)?;
        }
        Ok(())
    }

    /// Remove one expense: splice the amount out, then the memo
    ///
    /// Nothing is written when the amount is not found.
    pub fn delete(&mut self, expense: &Expense) -> Result<(), LedgerError> {
        let column = self.day_column(expense.date)?;
        let cell = self.amount_cell(&column, &expense.category)?;
        let current = self.store.read_cell(&cell)?;
        let next = cell::delete(&current, expense.amount)?;
        debug!("writing '{}' to {} (was '{}')", next, cell, current);
        self.store.write_cell(&cell, &next)?;
        if !expense.memo.is_empty() {
            let group = self.read_memo_group(&column)?;
            let write = group.delete(&expense.category, &expense.memo)?;
            self.write_memo_slot(&column, write.index, write.value)?;
        }
        Ok(())
    }

    /// Rewrite one expense in place
    ///
    /// A move across days or categories is a delete followed by a register;
    /// otherwise the amount and memo are edited where they are.
    pub fn edit(&mut self, target: &Expense, new: &Expense) -> Result<(), LedgerError> {
        if target.date == new.date
            && target.category == new.category
            && target.amount == new.amount
            && target.memo == new.memo
        {
            debug!("edit changes nothing, refusing");
            return Err(LedgerError::Unchanged);
        }
        if target.date != new.date || target.category != new.category {
            debug!(
                "moving expense from ({}, {}) to ({}, {})",
                target.date, target.category, new.date, new.category,
            );
            self.delete(target)?;
            return self.register(new);
        }
        let column = self.day_column(target.date)?;
        if target.amount != new.amount {
            let cell = self.amount_cell(&column, &target.category)?;
            let current = self.store.read_cell(&cell)?;
            let next = cell::edit(&current, target.amount, new.amount)?;
            debug!("writing '{}' to {} (was '{}')", next, cell, current);
            self.store.write_cell(&cell, &next)?;
        }
        if target.memo != new.memo {
            let group = self.read_memo_group(&column)?;
            let write = group.edit(&target.category, &target.memo, &new.memo)?;
            self.write_memo_slot(&column, write.index, write.value)?;
        }
        Ok(())
    }

    /// Evaluate one day column into per-category totals
    pub fn day_summary(&self, date: Date) -> Result<Summary, LedgerError> {
        let column = self.day_column(date)?;
        let range = ColumnRange::new(
            &column.sheet,
            &column.col,
            self.config.amount_row,
            self.config.amount_row_end() - 1,
        );
        let values = self.store.read_range(&range)?;
        let mut summary = Summary::new(date);
        for (category, value) in self.config.categories.iter().zip(values) {
            let total = match expr::evaluate(&value.raw()) {
                Some(total) => total,
                None => {
                    warn!("cell for {} on {} does not evaluate: '{}'", category, date, value);
                    0
                }
            };
            summary.register(&self.config, category, Amount(total));
        }
        Ok(summary)
    }

    /// Dump the day columns for the given dates
    ///
    /// Days without a column (not part of the book) are skipped; the dump
    /// is a snapshot and may be stale, which the history merge compensates.
    pub fn dump_days(&self, dates: &[Date]) -> Result<Vec<DayCells>, LedgerError> {
        let mut days = Vec::new();
        for &date in dates {
            let column = match self.day_column(date) {
                Ok(column) => column,
                Err(LedgerError::DayNotFound(_)) => {
                    debug!("no column for {}, skipping", date);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let amounts = ColumnRange::new(
                &column.sheet,
                &column.col,
                self.config.amount_row,
                self.config.amount_row_end() - 1,
            );
            let cells = self.store.read_range(&amounts)?;
            let memos = self
                .store
                .read_range(&self.memo_range(&column))?
                .iter()
                .map(|v| v.raw())
                .collect();
            days.push(DayCells { date, cells, memos });
        }
        Ok(days)
    }

    /// Rebuild the transaction records of the given dates from the book
    pub fn itemize(&self, dates: &[Date]) -> Result<Vec<Record>, LedgerError> {
        let days = self.dump_days(dates)?;
        Ok(Itemizer::new(&self.config).run(&days))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::date::Month::{self, *};
    use std::collections::HashMap;

    /// In-memory spreadsheet: day columns "B".."AF" on every month sheet
    struct FakeStore {
        cells: HashMap<CellRef, String>,
    }

    impl FakeStore {
        fn new() -> Self {
            Self { cells: HashMap::new() }
        }

        fn with_headers(year: usize, month: Month) -> Self {
            let mut store = Self::new();
            for day in 1..=month.count(year as u16) {
                let date = Date::from(year, month, day as usize).unwrap();
                store.cells.insert(
                    CellRef::new(date.sheet_name(), col_of(day), 1),
                    date.column_key(),
                );
            }
            store
        }

        fn raw(&self, cell: &CellRef) -> String {
            self.cells.get(cell).cloned().unwrap_or_default()
        }
    }

    fn col_of(day: u8) -> String {
        // day 1 -> B, day 2 -> C, ...
        let n = day as u32 + 1;
        if n <= 26 {
            char::from(b'A' + (n - 1) as u8).to_string()
        } else {
            format!("A{}", char::from(b'A' + (n - 27) as u8))
        }
    }

    impl SheetStore for FakeStore {
        fn read_cell(&self, cell: &CellRef) -> Result<CellValue, StoreError> {
            Ok(CellValue::from_raw(&self.raw(cell)))
        }

        fn write_cell(&mut self, cell: &CellRef, value: &CellValue) -> Result<(), StoreError> {
            self.cells.insert(cell.clone(), value.raw());
            Ok(())
        }

        fn read_range(&self, range: &ColumnRange) -> Result<Vec<CellValue>, StoreError> {
            Ok((range.row_start..=range.row_end)
                .map(|row| {
                    CellValue::from_raw(
                        &self.raw(&CellRef::new(&range.sheet, &range.col, row)),
                    )
                })
                .collect())
        }

        fn find_cell(&self, sheet: &str, content: &str) -> Result<Option<CellRef>, StoreError> {
            Ok(self
                .cells
                .iter()
                .find(|(cell, value)| cell.sheet == sheet && value.as_str() == content)
                .map(|(cell, _)| cell.clone()))
        }
    }

    fn config() -> BookConfig {
        BookConfig {
            categories: ["Food", "Transport"].iter().map(|s| s.to_string()).collect(),
            amount_row: 31,
            memo_row: 51,
            memo_slots: 4,
            memo_threshold: 500,
            memo_threshold_categories: vec!["Transport".to_string()],
            exclude_categories: vec![],
        }
    }

    macro_rules! dt {
        ( $y:tt - $m:tt - $d:tt ) => {
            Date::from($y, $m, $d).unwrap()
        }
    }

    fn ledger() -> Ledger<FakeStore> {
        Ledger::new(FakeStore::with_headers(2023, Month::Apr), config())
    }

    #[test]
    fn register_accumulates_formula_and_memo() {
        let mut ledger = ledger();
        let date = dt!(2023-Apr-5);
        ledger
            .register(&Expense::new(date, "Food", Amount(320), "bread"))
            .unwrap();
        ledger
            .register(&Expense::new(date, "Food", Amount(150), "eggs"))
            .unwrap();
        // day 5 -> column F, Food -> row 31, memos -> row 51
        let cell = CellRef::new("Apr", "F", 31);
        assert_eq!(ledger.store.raw(&cell), "=320+150");
        let memo = CellRef::new("Apr", "F", 51);
        assert_eq!(ledger.store.raw(&memo), "Food: bread, eggs");
    }

    #[test]
    fn delete_is_a_no_op_when_absent() {
        let mut ledger = ledger();
        let date = dt!(2023-Apr-5);
        ledger
            .register(&Expense::new(date, "Food", Amount(320), ""))
            .unwrap();
        let err = ledger.delete(&Expense::new(date, "Food", Amount(999), ""));
        assert!(matches!(err, Err(LedgerError::Cell(CellError::NotFound))));
        assert_eq!(ledger.store.raw(&CellRef::new("Apr", "F", 31)), "=320");
    }

    #[test]
    fn delete_removes_amount_and_memo() {
        let mut ledger = ledger();
        let date = dt!(2023-Apr-5);
        ledger
            .register(&Expense::new(date, "Food", Amount(320), "bread"))
            .unwrap();
        ledger
            .delete(&Expense::new(date, "Food", Amount(320), "bread"))
            .unwrap();
        assert_eq!(ledger.store.raw(&CellRef::new("Apr", "F", 31)), "0");
        assert_eq!(ledger.store.raw(&CellRef::new("Apr", "F", 51)), "");
    }

    #[test]
    fn edit_same_day_rewrites_in_place() {
        let mut ledger = ledger();
        let date = dt!(2023-Apr-5);
        ledger
            .register(&Expense::new(date, "Food", Amount(320), "bread"))
            .unwrap();
        ledger
            .edit(
                &Expense::new(date, "Food", Amount(320), "bread"),
                &Expense::new(date, "Food", Amount(280), "bread"),
            )
            .unwrap();
        assert_eq!(ledger.store.raw(&CellRef::new("Apr", "F", 31)), "=280");
    }

    #[test]
    fn edit_across_days_moves_the_expense() {
        let mut ledger = ledger();
        ledger
            .register(&Expense::new(dt!(2023-Apr-5), "Food", Amount(320), ""))
            .unwrap();
        ledger
            .edit(
                &Expense::new(dt!(2023-Apr-5), "Food", Amount(320), ""),
                &Expense::new(dt!(2023-Apr-6), "Food", Amount(320), ""),
            )
            .unwrap();
        assert_eq!(ledger.store.raw(&CellRef::new("Apr", "F", 31)), "0");
        assert_eq!(ledger.store.raw(&CellRef::new("Apr", "G", 31)), "=320");
    }

    #[test]
    fn identical_edit_is_refused() {
        let mut ledger = ledger();
        let e = Expense::new(dt!(2023-Apr-5), "Food", Amount(320), "");
        ledger.register(&e).unwrap();
        assert!(matches!(ledger.edit(&e, &e), Err(LedgerError::Unchanged)));
    }

    #[test]
    fn summary_evaluates_formulas() {
        let mut ledger = ledger();
        let date = dt!(2023-Apr-5);
        ledger
            .register(&Expense::new(date, "Food", Amount(320), ""))
            .unwrap();
        ledger
            .register(&Expense::new(date, "Food", Amount(180), ""))
            .unwrap();
        ledger
            .register(&Expense::new(date, "Transport", Amount(220), ""))
            .unwrap();
        let summary = ledger.day_summary(date).unwrap();
        assert_eq!(summary.query("Food"), Amount(500));
        assert_eq!(summary.total(), Amount(720));
    }

    #[test]
    fn itemize_round_trips_registrations() {
        let mut ledger = ledger();
        let date = dt!(2023-Apr-5);
        ledger
            .register(&Expense::new(date, "Food", Amount(320), "bread"))
            .unwrap();
        ledger
            .register(&Expense::new(date, "Food", Amount(150), "eggs"))
            .unwrap();
        let records = ledger.itemize(&[date]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, Amount(320));
        assert_eq!(records[0].memo, "bread");
        assert_eq!(records[1].amount, Amount(150));
        assert_eq!(records[1].memo, "eggs");
    }

    #[test]
    fn unknown_day_is_reported() {
        let mut ledger = ledger();
        let err = ledger.register(&Expense::new(dt!(2023-May-5), "Food", Amount(1), ""));
        assert!(matches!(err, Err(LedgerError::DayNotFound(_))));
    }

    #[test]
    fn unknown_category_is_reported() {
        let mut ledger = ledger();
        let err = ledger.register(&Expense::new(dt!(2023-Apr-5), "Gifts", Amount(1), ""));
        assert!(matches!(err, Err(LedgerError::UnknownCategory(_))));
    }
}
