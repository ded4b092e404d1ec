//! Reconcile several transaction logs into one canonical history
//!
//! The same transaction can legitimately appear in more than one log: once
//! in the locally appended history and once in a log rebuilt from a grid
//! dump. It can also legitimately appear twice in a *single* log (two
//! coffees, same price, same day), and those repeats must survive.
//!
//! Rows agreeing on (calendar date, category, memo, amount) form an
//! equivalence class. A class confined to one source passes through
//! untouched. A class spanning several sources keeps only the rows of the
//! source holding the latest-timestamped row of the class; that source's
//! repeats all survive, every other source's rows are dropped. The result
//! is sorted by timestamp and fully replaces the canonical log, which makes
//! the merge idempotent.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;

use crate::util::entry::Record;

type ClassKey = (NaiveDate, String, String, i64);

fn class_key(record: &Record) -> ClassKey {
    (
        record.timestamp.date(),
        record.category.clone(),
        record.memo.clone(),
        record.amount.0,
    )
}

/// Merge N logs into one, newest-source-wins across files
pub fn merge(sources: &[Vec<Record>]) -> Vec<Record> {
    // group every row into its class, remembering its source
    let mut classes: HashMap<ClassKey, Vec<(usize, &Record)>> = HashMap::new();
    for (source, rows) in sources.iter().enumerate() {
        for row in rows {
            classes.entry(class_key(row)).or_default().push((source, row));
        }
    }

    // for cross-source classes, the source of the latest row wins
    let mut winners: HashMap<ClassKey, usize> = HashMap::new();
    for (key, members) in &classes {
        let spread = members.iter().any(|(s, _)| *s != members[0].0);
        if !spread {
            continue;
        }
        let mut best = members[0];
        for member in &members[1..] {
            if member.1.timestamp >= best.1.timestamp {
                best = *member;
            }
        }
        winners.insert(key.clone(), best.0);
    }

    let mut merged: Vec<Record> = Vec::new();
    for (source, rows) in sources.iter().enumerate() {
        for row in rows {
            match winners.get(&class_key(row)) {
                Some(&winner) if winner != source => {
                    debug!("dropping cross-source duplicate: {}", row);
                }
                _ => merged.push(row.clone()),
            }
        }
    }
    merged.sort_by_key(|r| r.timestamp);
    merged
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::history::log::parse_timestamp;
    use crate::util::entry::Amount;

    fn rec(ts: &str, category: &str, memo: &str, amount: i64) -> Record {
        Record::new(parse_timestamp(ts).unwrap(), category, memo, Amount(amount))
    }

    #[test]
    fn merging_once_or_twice_is_the_same() {
        let local = vec![
            rec("2023-04-05T08:12:00", "Food", "bread", 320),
            rec("2023-04-06T09:00:00", "Daily", "", 150),
        ];
        let downloaded = vec![
            rec("2023-04-05T00:00:00", "Food", "bread", 320),
            rec("2023-04-07T00:00:00", "Transport", "", 220),
        ];
        let once = merge(&[local, downloaded]);
        let twice = merge(&[once.clone()]);
        assert_eq!(once, twice);
    }

    #[test]
    fn within_file_repeats_survive_a_disjoint_source() {
        let local = vec![
            rec("2023-04-05T10:00:00", "Food", "coffee", 150),
            rec("2023-04-05T16:00:00", "Food", "coffee", 150),
        ];
        let other = vec![rec("2023-04-05T12:00:00", "Daily", "soap", 400)];
        let merged = merge(&[local, other]);
        assert_eq!(merged.len(), 3);
        let coffees = merged.iter().filter(|r| r.memo == "coffee").count();
        assert_eq!(coffees, 2);
    }

    #[test]
    fn cross_source_duplicates_keep_the_latest_source() {
        // same calendar day, same shape: the locally stored row is newer
        // than the midnight-stamped downloaded one
        let downloaded = vec![rec("2023-04-05T00:00:00", "Food", "bread", 320)];
        let local = vec![rec("2023-04-05T08:12:00", "Food", "bread", 320)];
        let merged = merge(&[downloaded, local]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].timestamp, parse_timestamp("2023-04-05T08:12:00").unwrap());
    }

    #[test]
    fn winning_source_keeps_its_repeats() {
        let local = vec![
            rec("2023-04-05T10:00:00", "Food", "coffee", 150),
            rec("2023-04-05T16:00:00", "Food", "coffee", 150),
        ];
        let downloaded = vec![rec("2023-04-05T00:00:00", "Food", "coffee", 150)];
        let merged = merge(&[downloaded, local]);
        // both local repeats survive, the downloaded copy goes
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|r| r.timestamp.time() != chrono::NaiveTime::MIN));
    }

    #[test]
    fn different_days_are_different_classes() {
        let a = vec![rec("2023-04-05T10:00:00", "Food", "bread", 320)];
        let b = vec![rec("2023-04-06T10:00:00", "Food", "bread", 320)];
        let merged = merge(&[a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn output_is_chronological() {
        let a = vec![
            rec("2023-04-07T10:00:00", "Food", "", 100),
            rec("2023-04-05T10:00:00", "Food", "", 200),
        ];
        let b = vec![rec("2023-04-06T10:00:00", "Daily", "", 300)];
        let merged = merge(&[a, b]);
        let stamps: Vec<_> = merged.iter().map(|r| r.timestamp).collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
    }
}
