//! Itemized transaction history
//!
//! The spreadsheet aggregates, the history logs enumerate. This module owns
//! the flat log format, the itemizer that rebuilds individual transactions
//! from a grid dump, and the merger that reconciles several log files into
//! one canonical history.

pub mod itemize;
pub mod log;
pub mod merge;
