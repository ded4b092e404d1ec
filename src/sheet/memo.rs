//! The memo slot pool of one day column
//!
//! Below the amount rows, each day column carries a handful of free-text
//! cells. A category claims at most one of them and accumulates its memos
//! there as `"<category>: <memo1>, <memo2>, ..."`. Occupied slots form a
//! contiguous prefix; when every slot is taken the pool refuses further
//! categories instead of overwriting anything.
//!
//! Like the cell mutator, everything here is pure: operations return the
//! single `SlotWrite` to perform, and the caller owns the store write.

use std::fmt;

use log::{debug, warn};

/// The N memo cells of one day column, in row order
#[derive(Debug, Clone)]
pub struct MemoGroup {
    slots: Vec<String>,
}

/// One slot update to write back: `slots[index]` becomes `value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWrite {
    pub index: usize,
    pub value: String,
}

/// Failure of a memo operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoError {
    /// every slot is occupied by another category
    Full,
    /// no slot / no fragment for the given category or memo
    NotFound,
}

impl fmt::Display for MemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoError::Full => write!(f, "no free memo slot left"),
            MemoError::NotFound => write!(f, "memo not found"),
        }
    }
}

impl MemoGroup {
    pub fn new(slots: Vec<String>) -> Self {
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot owned by `category`, if any
    fn slot_of(&self, category: &str) -> Option<usize> {
        let prefix = format!("{}:", category);
        self.slots.iter().position(|s| s.starts_with(&prefix))
    }

    /// Memo fragments of `category`, in stored order
    pub fn fragments(&self, category: &str) -> Option<Vec<String>> {
        let i = self.slot_of(category)?;
        let body = &self.slots[i][category.len() + 1..];
        Some(split_fragments(body))
    }

    /// Append a memo for `category`
    ///
    /// Reuses the category's slot when it has one, otherwise claims the
    /// first empty slot. A full pool is an error and nothing is written.
    pub fn add(&self, category: &str, memo: &str) -> Result<SlotWrite, MemoError> {
        if let Some(i) = self.slot_of(category) {
            return Ok(SlotWrite {
                index: i,
                value: format!("{}, {}", self.slots[i], memo),
            });
        }
        match self.slots.iter().position(|s| s.trim().is_empty()) {
            Some(i) => Ok(SlotWrite {
                index: i,
                value: format!("{}: {}", category, memo),
            }),
            None => {
                warn!("no space left to write a memo for '{}'", category);
                Err(MemoError::Full)
            }
        }
    }

    /// Remove the last occurrence of `memo` from the category's slot
    ///
    /// Removing the final fragment blanks the slot; removing the first one
    /// re-renders the slot so the `"<category>:"` prefix stays intact.
    pub fn delete(&self, category: &str, memo: &str) -> Result<SlotWrite, MemoError> {
        let i = self.slot_of(category).ok_or(MemoError::NotFound)?;
        let mut fragments = split_fragments(&self.slots[i][category.len() + 1..]);
        let at = fragments.iter().rposition(|f| f == memo).ok_or_else(|| {
            debug!("delete failed: no memo '{}' under '{}'", memo, category);
            MemoError::NotFound
        })?;
        fragments.remove(at);
        Ok(SlotWrite {
            index: i,
            value: render_slot(category, &fragments),
        })
    }

    /// Replace the last occurrence of `old` with `new`
    ///
    /// Degenerates to a pure `add` when `old` is empty and to a pure
    /// `delete` when `new` is empty.
    pub fn edit(&self, category: &str, old: &str, new: &str) -> Result<SlotWrite, MemoError> {
        if old.is_empty() {
            return self.add(category, new);
        }
        if new.is_empty() {
            return self.delete(category, old);
        }
        let i = self.slot_of(category).ok_or(MemoError::NotFound)?;
        let mut fragments = split_fragments(&self.slots[i][category.len() + 1..]);
        let at = fragments.iter().rposition(|f| f == old).ok_or_else(|| {
            debug!("edit failed: no memo '{}' under '{}'", old, category);
            MemoError::NotFound
        })?;
        fragments[at] = new.to_string();
        Ok(SlotWrite {
            index: i,
            value: render_slot(category, &fragments),
        })
    }
}

fn split_fragments(body: &str) -> Vec<String> {
    body.split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

fn render_slot(category: &str, fragments: &[String]) -> String {
    if fragments.is_empty() {
        String::new()
    } else {
        format!("{}: {}", category, fragments.join(", "))
    }
}
