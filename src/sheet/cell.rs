//! Arithmetic mutations of one ledger cell
//!
//! A cell goes through three shapes: `0` (empty), a bare integer (one
//! transaction), and a `=`-prefixed formula (several). `add` appends an
//! addend, `delete` splices one out, `edit` rewrites one in place. All three
//! are pure: they map the current value to the next one and never touch the
//! store themselves, so a failed operation has nothing to roll back.
//!
//! Matching is token-level: the formula is lexed once into operators and
//! integer literals, and a target only matches a whole literal preceded by
//! `=` or `+`. This is what keeps `12` from matching inside `120`. The
//! rightmost match wins, which deletes the most recently appended addend on
//! ties.

use std::fmt;

use log::{debug, warn};

use crate::util::entry::Amount;

/// Contents of one cell as handed over by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    /// a numeric cell (`0` means empty)
    Num(i64),
    /// anything else, notably `=`-prefixed formulas
    Text(String),
}

impl CellValue {
    /// Classify a raw string: empty and integer cells become `Num`
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Num(0);
        }
        match trimmed.parse::<i64>() {
            Ok(v) => CellValue::Num(v),
            Err(_) => CellValue::Text(raw.to_string()),
        }
    }

    /// The text that goes back into the store
    pub fn raw(&self) -> String {
        match self {
            CellValue::Num(v) => v.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Whether this cell records no transaction at all
    ///
    /// `=0+500` is not empty; only `0` and a bare `=0` are.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Num(v) => *v == 0,
            CellValue::Text(s) => s.trim() == "=0",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Failure of a `delete` or `edit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    /// the target amount is not an addend of the cell
    NotFound,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::NotFound => write!(f, "target amount not found in cell"),
        }
    }
}

/// Append one transaction to a cell
///
/// `0` becomes `=amount`, a bare integer `v` becomes `=v+amount`, a formula
/// gets `+amount` appended. Any other content is overwritten with the plain
/// amount; that recovery is deliberately lossy and logged.
pub fn add(current: &CellValue, amount: Amount) -> CellValue {
    match current {
        CellValue::Num(0) => CellValue::Text(format!("={}", amount)),
        CellValue::Num(v) => CellValue::Text(format!("={}+{}", v, amount)),
        CellValue::Text(s) if s.starts_with('=') => CellValue::Text(format!("{}+{}", s, amount)),
        CellValue::Text(s) => {
            warn!("overwriting malformed cell '{}' with plain {}", s, amount);
            CellValue::Num(amount.0)
        }
    }
}

/// Remove the most recently appended occurrence of `target`
///
/// Succeeds when the cell is a bare integer equal to `target` (the cell
/// resets to `0`) or a formula containing `target` as an addend. Fails with
/// no candidate value otherwise.
pub fn delete(current: &CellValue, target: Amount) -> Result<CellValue, CellError> {
    match current {
        CellValue::Num(v) if *v == target.0 => Ok(CellValue::Num(0)),
        CellValue::Num(v) => {
            debug!("delete failed: cell holds {}, not {}", v, target);
            Err(CellError::NotFound)
        }
        CellValue::Text(s) => {
            let m = rightmost_addend(s, target.0).ok_or_else(|| {
                debug!("delete failed: no addend {} in '{}'", target, s);
                CellError::NotFound
            })?;
            let rest = format!("{}{}", &s[..m.op_start], &s[m.num_end..]);
            let rest = rest.trim();
            if rest.is_empty() {
                Ok(CellValue::Num(0))
            } else if let Some(tail) = rest.strip_prefix('+') {
                // the leading addend was removed, promote the next one
                Ok(CellValue::Text(format!("={}", tail)))
            } else {
                Ok(CellValue::Text(rest.to_string()))
            }
        }
    }
}

/// Replace the most recently appended occurrence of `target` with `new`
///
/// A bare-integer cell becomes the bare new integer; inside a formula the
/// literal is rewritten in place and every surrounding operator survives.
pub fn edit(current: &CellValue, target: Amount, new: Amount) -> Result<CellValue, CellError> {
    match current {
        CellValue::Num(v) if *v == target.0 => Ok(CellValue::Num(new.0)),
        CellValue::Num(v) => {
            debug!("edit failed: cell holds {}, not {}", v, target);
            Err(CellError::NotFound)
        }
        CellValue::Text(s) => {
            let m = rightmost_addend(s, target.0).ok_or_else(|| {
                debug!("edit failed: no addend {} in '{}'", target, s);
                CellError::NotFound
            })?;
            Ok(CellValue::Text(format!(
                "{}{}{}",
                &s[..m.num_start],
                new,
                &s[m.num_end..],
            )))
        }
    }
}

/// Byte spans of one matched addend: its leading operator and its literal
struct AddendMatch {
    op_start: usize,
    num_start: usize,
    num_end: usize,
}

/// Rightmost occurrence of `target` as a whole literal preceded by `=` or `+`
fn rightmost_addend(s: &str, target: i64) -> Option<AddendMatch> {
    let wanted = target.to_string();
    let bytes = s.as_bytes();
    let mut found: Option<AddendMatch> = None;
    // (position, byte) of the last operator seen before the current literal
    let mut last_op: Option<(usize, u8)> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if let Some((pos, op)) = last_op {
                if (op == b'=' || op == b'+') && &s[start..i] == wanted {
                    found = Some(AddendMatch {
                        op_start: pos,
                        num_start: start,
                        num_end: i,
                    });
                }
            }
            last_op = None;
        } else {
            if b != b' ' {
                last_op = Some((i, b));
            }
            i += 1;
        }
    }
    found
}

#[cfg(test)]
mod test {
    use super::*;

    fn cell(raw: &str) -> CellValue {
        CellValue::from_raw(raw)
    }

    macro_rules! added {
        ( $cell:expr, $amount:expr => $expected:expr ) => {
            assert_eq!(add(&cell($cell), Amount($amount)).raw(), $expected);
        };
    }

    #[test]
    fn add_transitions() {
        added!("0", 500 => "=500");
        added!("", 500 => "=500");
        added!("320", 500 => "=320+500");
        added!("=320", 500 => "=320+500");
        added!("=120+200", 500 => "=120+200+500");
    }

    #[test]
    fn add_overwrites_malformed() {
        added!("#REF!", 500 => "500");
        added!("broken", 42 => "42");
    }

    macro_rules! deleted {
        ( $cell:expr, $target:expr => $expected:expr ) => {
            assert_eq!(delete(&cell($cell), Amount($target)).unwrap().raw(), $expected);
        };
    }

    #[test]
    fn delete_bare_integer() {
        deleted!("320", 320 => "0");
        assert_eq!(delete(&cell("320"), Amount(100)), Err(CellError::NotFound));
    }

    #[test]
    fn delete_from_formula() {
        deleted!("=500", 500 => "0");
        deleted!("=120+200", 200 => "=120");
        deleted!("=120+200", 120 => "=200");
        deleted!("=120+200+80", 200 => "=120+80");
    }

    #[test]
    fn delete_prefers_rightmost() {
        // two identical addends: only the later one goes
        deleted!("=100+100", 100 => "=100");
        deleted!("=100+50+100", 100 => "=100+50");
    }

    #[test]
    fn delete_never_splits_literals() {
        // 12 must not match inside 120
        deleted!("=12+120", 12 => "=120");
        deleted!("=120+12", 120 => "=12");
        assert_eq!(delete(&cell("=1200"), Amount(120)), Err(CellError::NotFound));
        assert_eq!(delete(&cell("=1200"), Amount(200)), Err(CellError::NotFound));
    }

    #[test]
    fn delete_ignores_multiplication_factors() {
        // `3` in `120*3` follows `*`, not `=`/`+`
        assert_eq!(delete(&cell("=120*3"), Amount(3)), Err(CellError::NotFound));
        deleted!("=120*3+50", 50 => "=120*3");
    }

    #[test]
    fn delete_not_found_is_a_no_op() {
        let before = cell("=120+200");
        assert_eq!(delete(&before, Amount(999)), Err(CellError::NotFound));
        assert_eq!(before.raw(), "=120+200");
    }

    macro_rules! edited {
        ( $cell:expr, $target:expr => $new:expr => $expected:expr ) => {
            assert_eq!(
                edit(&cell($cell), Amount($target), Amount($new)).unwrap().raw(),
                $expected,
            );
        };
    }

    #[test]
    fn edit_bare_integer_stays_bare() {
        edited!("100", 100 => 250 => "250");
    }

    #[test]
    fn edit_formula_preserves_operators() {
        edited!("=150", 150 => 250 => "=250");
        edited!("=120+200", 200 => 250 => "=120+250");
        edited!("=120+200", 120 => 80 => "=80+200");
        edited!("=100+100", 100 => 75 => "=100+75");
        edited!("=120*3+50", 50 => 60 => "=120*3+60");
    }

    #[test]
    fn edit_not_found() {
        assert_eq!(edit(&cell("=120+200"), Amount(1), Amount(2)), Err(CellError::NotFound));
        assert_eq!(edit(&cell("77"), Amount(1), Amount(2)), Err(CellError::NotFound));
    }

    #[test]
    fn spaced_formulas_still_match()  {
        deleted!("=120 + 200", 200 => "=120");
        edited!("= 120+200", 120 => 80 => "= 80+200");
    }

    #[test]
    fn raw_classification() {
        assert_eq!(cell(""), CellValue::Num(0));
        assert_eq!(cell("  "), CellValue::Num(0));
        assert_eq!(cell("320"), CellValue::Num(320));
        assert_eq!(cell("=320"), CellValue::Text("=320".to_string()));
        assert!(cell("0").is_empty());
        assert!(cell("=0").is_empty());
        assert!(!cell("=0+500").is_empty());
    }
}
