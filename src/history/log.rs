//! The append-only transaction log
//!
//! One record per line, comma-delimited, no header:
//!
//! ```txt
//! 2023-04-05T12:31:08.123456,Food,bread,320
//! ```
//!
//! Three-field rows (no memo) are accepted on read. Rows that do not parse
//! are skipped with a warning; a corrupted line must never block
//! reconciliation. Besides reading and writing, this module carries the
//! maintenance operations on the local log: append, delete-last-match,
//! edit-last-match, and the frequent/recent suggestion queries.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};

use crate::util::entry::{Amount, Record};

/// ISO-8601 with microseconds, the one format ever written
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Parse a timestamp, tolerating missing fractions and date-only rows
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Some(t);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse one log line, `None` for blank or malformed rows
pub fn parse_row(line: &str) -> Option<Record> {
    let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
    if line.trim().is_empty() {
        return None;
    }
    let fields: Vec<&str> = line.split(',').collect();
    let (ts, category, memo, amount) = match fields.as_slice() {
        [ts, category, memo, amount] => (*ts, *category, *memo, *amount),
        [ts, category, amount] => (*ts, *category, "", *amount),
        _ => {
            warn!("skipping malformed log row: '{}'", line);
            return None;
        }
    };
    let timestamp = match parse_timestamp(ts) {
        Some(t) => t,
        None => {
            warn!("skipping log row with unreadable timestamp: '{}'", line);
            return None;
        }
    };
    let amount = match amount.trim().parse::<i64>() {
        Ok(a) => a,
        Err(_) => {
            warn!("skipping log row with unreadable amount: '{}'", line);
            return None;
        }
    };
    Some(Record::new(timestamp, category, memo, Amount(amount)))
}

/// Render one record as its log line
pub fn format_row(record: &Record) -> String {
    format!(
        "{},{},{},{}",
        record.timestamp.format(TIMESTAMP_FORMAT),
        record.category,
        record.memo,
        record.amount,
    )
}

/// Read a whole log file; malformed rows are dropped, not fatal
pub fn read_log(path: &Path) -> io::Result<Vec<Record>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.lines().filter_map(parse_row).collect())
}

/// Write a whole log file, replacing its previous contents
pub fn write_log(path: &Path, records: &[Record]) -> io::Result<()> {
    let mut out = String::new();
    for record in records {
        out.push_str(&format_row(record));
        out.push('\n');
    }
    std::fs::write(path, out)
}

/// Append one record to the log, creating the file if needed
pub fn append(path: &Path, record: &Record) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", format_row(record))?;
    debug!("stored record: {}", format_row(record));
    Ok(())
}

/// Drop the last record matching the given filters
///
/// The date is compared calendar-day only; empty category/memo and a zero
/// amount mean "any". Returns whether a record was removed.
pub fn delete_last(
    records: &mut Vec<Record>,
    date: NaiveDate,
    category: &str,
    memo: &str,
    amount: Amount,
) -> bool {
    let at = records.iter().rposition(|r| {
        r.timestamp.date() == date
            && (category.is_empty() || r.category == category)
            && (memo.is_empty() || r.memo == memo)
            && (!amount.nonzero() || r.amount == amount)
    });
    match at {
        Some(i) => {
            let gone = records.remove(i);
            debug!("deleted record: {}", format_row(&gone));
            true
        }
        None => {
            debug!(
                "no record to delete for ({}, {}, {}, {})",
                date, category, memo, amount,
            );
            false
        }
    }
}

/// Replacement values for an edited record; `None` keeps the old field
#[derive(Debug, Default, Clone)]
pub struct Revision {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub amount: Option<Amount>,
    pub memo: Option<String>,
}

/// Rewrite the last record matching the given filters
///
/// The edited record is re-stamped at midnight of its (possibly new) date
/// and the log is re-sorted chronologically. Returns whether a record was
/// changed.
pub fn edit_last(
    records: &mut Vec<Record>,
    date: NaiveDate,
    category: &str,
    memo: &str,
    amount: Amount,
    new: &Revision,
) -> bool {
    let at = records.iter().rposition(|r| {
        r.timestamp.date() == date
            && (category.is_empty() || r.category == category)
            && (memo.is_empty() || r.memo == memo)
            && (!amount.nonzero() || r.amount == amount)
    });
    let i = match at {
        Some(i) => i,
        None => {
            debug!(
                "no record to edit for ({}, {}, {}, {})",
                date, category, memo, amount,
            );
            return false;
        }
    };
    let new_date = new.date.unwrap_or(date);
    // the wall-clock part of the original stamp is not kept
    let stamp = match new_date.and_hms_opt(0, 0, 0) {
        Some(t) => t,
        None => unreachable!(),
    };
    records[i].timestamp = stamp;
    if let Some(category) = &new.category {
        records[i].category = category.clone();
    }
    if let Some(amount) = new.amount {
        records[i].amount = amount;
    }
    records[i].memo = new.memo.clone().unwrap_or_default();
    records.sort_by_key(|r| r.timestamp);
    true
}

/// A transaction shape worth suggesting again, date stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub category: String,
    pub memo: String,
    pub amount: Amount,
}

impl Suggestion {
    fn of(record: &Record) -> Self {
        Self {
            category: record.category.clone(),
            memo: record.memo.clone(),
            amount: record.amount,
        }
    }
}

/// Transactions recorded at least twice, most repeated first
pub fn frequent(records: &[Record], count: usize) -> Vec<Suggestion> {
    let mut ordinals: HashMap<(String, String, i64), (usize, usize)> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        let key = (record.category.clone(), record.memo.clone(), record.amount.0);
        let entry = ordinals.entry(key).or_insert((0, i));
        entry.0 += 1;
    }
    let mut seen: Vec<_> = ordinals
        .into_iter()
        .filter(|(_, (n, _))| *n >= 2)
        .collect();
    // most repeated first, earliest first appearance breaking ties
    seen.sort_by_key(|(_, (n, first))| (std::cmp::Reverse(*n), *first));
    seen.into_iter()
        .take(count)
        .map(|((category, memo, amount), _)| Suggestion {
            category,
            memo,
            amount: Amount(amount),
        })
        .collect()
}

/// Latest distinct transactions, newest first
pub fn recent(records: &[Record], count: usize) -> Vec<Suggestion> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
    let mut out: Vec<Suggestion> = Vec::new();
    for record in sorted {
        let suggestion = Suggestion::of(record);
        if !out.contains(&suggestion) {
            out.push(suggestion);
            if out.len() == count {
                break;
            }
        }
    }
    out
}
