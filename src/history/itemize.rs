//! Rebuild individual transactions from a grid dump
//!
//! A reconciliation pass dumps every day column of the book: the formula of
//! each (category, day) cell plus the memo slots underneath. The itemizer
//! expands each formula so that every addend is one transaction, then pairs
//! the addends with the category's memo fragments in order.
//!
//! The pairing is best-effort. For most categories a missing memo tail just
//! means memo-less transactions; for the configured threshold categories
//! (typically transport) the convention is that only amounts above the
//! threshold were ever given a memo, so the memos are attached to those, in
//! order, and everything below the threshold goes without.

use std::collections::VecDeque;

use log::debug;

use crate::expr;
use crate::util::{
    config::BookConfig,
    date::Date,
    entry::{Amount, Record},
};
use crate::sheet::{memo::MemoGroup, CellValue};

/// Everything dumped for one day column
#[derive(Debug, Clone)]
pub struct DayCells {
    pub date: Date,
    /// one cell per configured category, in category order
    pub cells: Vec<CellValue>,
    /// the memo slots under the column, in row order
    pub memos: Vec<String>,
}

/// Grid walker; holds the configuration that defines the row layout
pub struct Itemizer<'c> {
    config: &'c BookConfig,
}

impl<'c> Itemizer<'c> {
    pub fn new(config: &'c BookConfig) -> Self {
        Self { config }
    }

    /// Itemize a sequence of dumped day columns into ordered records
    pub fn run(&self, days: &[DayCells]) -> Vec<Record> {
        let mut records = Vec::new();
        for day in days {
            self.itemize_day(day, &mut records);
        }
        records
    }

    fn itemize_day(&self, day: &DayCells, out: &mut Vec<Record>) {
        let stamp = day.date.midnight();
        let group = MemoGroup::new(day.memos.clone());
        for (idx, category) in self.config.categories.iter().enumerate() {
            let cell = match day.cells.get(idx) {
                Some(cell) => cell,
                None => break,
            };
            if cell.is_empty() {
                continue;
            }
            let expanded = expr::expand(&cell.raw());
            let amounts = positive_literals(&expanded);
            if amounts.is_empty() {
                continue;
            }
            let memos = self.pair_memos(category, &amounts, group.fragments(category));
            for (amount, memo) in amounts.into_iter().zip(memos) {
                out.push(Record::new(stamp, category, memo, Amount(amount)));
            }
        }
    }

    /// One memo per amount, positionally
    fn pair_memos(
        &self,
        category: &str,
        amounts: &[i64],
        fragments: Option<Vec<String>>,
    ) -> Vec<String> {
        let mut memos = fragments.unwrap_or_default();
        if amounts.len() <= memos.len() {
            // excess fragments have nothing to attach to and are dropped
            return memos;
        }
        if self.config.follows_threshold(category) {
            debug!(
                "memo gap for {}: {} amounts, {} memos; applying threshold pairing",
                category,
                amounts.len(),
                memos.len(),
            );
            let mut queue: VecDeque<String> = memos.into();
            amounts
                .iter()
                .map(|a| {
                    if *a > self.config.memo_threshold {
                        queue.pop_front().unwrap_or_default()
                    } else {
                        String::new()
                    }
                })
                .collect()
        } else {
            memos.resize(amounts.len(), String::new());
            memos
        }
    }
}

/// Every positive integer literal of an expanded formula, left to right
fn positive_literals(expanded: &str) -> Vec<i64> {
    let bytes = expanded.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if let Ok(value) = expanded[start..i].parse::<i64>() {
                if value > 0 {
                    out.push(value);
                }
            }
        } else {
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::date::Month::*;

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

    fn day(date: Date, cells: &[&str], memos: &[&str]) -> DayCells {
        DayCells {
            date,
            cells: cells.iter().map(|c| CellValue::from_raw(c)).collect(),
            memos: memos.iter().map(|m| m.to_string()).collect(),
        }
    }

    macro_rules! dt {
        ( $y:tt - $m:tt - $d:tt ) => {
            Date::from($y, $m, $d).unwrap()
        }
    }

    #[test]
    fn zero_cells_are_skipped() {
        let config = config();
        let days = [day(dt!(2023-Apr-5), &["0", "=0"], &["", "", "", ""])];
        assert!(Itemizer::new(&config).run(&days).is_empty());
    }

    #[test]
    fn addends_pair_with_memos_in_order() {
        let config = config();
        let days = [day(
            dt!(2023-Apr-5),
            &["=320+150", "0"],
            &["Food: bread, eggs", "", "", ""],
        )];
        let records = Itemizer::new(&config).run(&days);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, Amount(320));
        assert_eq!(records[0].memo, "bread");
        assert_eq!(records[1].amount, Amount(150));
        assert_eq!(records[1].memo, "eggs");
        assert_eq!(records[0].timestamp, dt!(2023-Apr-5).midnight());
    }

    #[test]
    fn multiplications_expand_to_repeats() {
        let config = config();
        let days = [day(dt!(2023-Apr-5), &["=120*3", "0"], &["", "", "", ""])];
        let records = Itemizer::new(&config).run(&days);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.amount == Amount(120)));
        assert!(records.iter().all(|r| r.memo.is_empty()));
    }

    #[test]
    fn missing_memos_pad_with_empty() {
        let config = config();
        let days = [day(
            dt!(2023-Apr-5),
            &["=320+150+90", "0"],
            &["Food: bread", "", "", ""],
        )];
        let records = Itemizer::new(&config).run(&days);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].memo, "bread");
        assert_eq!(records[1].memo, "");
        assert_eq!(records[2].memo, "");
    }

    #[test]
    fn threshold_categories_memo_large_amounts_only() {
        let config = config();
        let days = [day(
            dt!(2023-Apr-5),
            &["0", "=180+800+320+1200"],
            &["Transport: shinkansen, airport bus", "", "", ""],
        )];
        let records = Itemizer::new(&config).run(&days);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].memo, "");
        assert_eq!(records[1].memo, "shinkansen");
        assert_eq!(records[2].memo, "");
        assert_eq!(records[3].memo, "airport bus");
    }

    #[test]
    fn threshold_pairing_only_kicks_in_on_gaps() {
        // memo count matches addend count: plain positional pairing
        let config = config();
        let days = [day(
            dt!(2023-Apr-5),
            &["0", "=180+800"],
            &["Transport: bus, taxi", "", "", ""],
        )];
        let records = Itemizer::new(&config).run(&days);
        assert_eq!(records[0].memo, "bus");
        assert_eq!(records[1].memo, "taxi");
    }

    #[test]
    fn zero_addends_never_emit() {
        let config = config();
        let days = [day(dt!(2023-Apr-5), &["=5*0+300", "0"], &["", "", "", ""])];
        let records = Itemizer::new(&config).run(&days);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Amount(300));
    }

    #[test]
    fn several_days_stay_ordered() {
        let config = config();
        let days = [
            day(dt!(2023-Apr-5), &["=320", "0"], &["", "", "", ""]),
            day(dt!(2023-Apr-6), &["0", "=250"], &["", "", "", ""]),
        ];
        let records = Itemizer::new(&config).run(&days);
        assert_eq!(records.len(), 2);
        assert!(records[0].timestamp < records[1].timestamp);
        assert_eq!(records[1].category, "Transport");
    }
}
