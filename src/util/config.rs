//! Book geometry and category definitions
//!
//! Everything here is externally supplied: the ordered category list decides
//! which row a category lives in, and the memo pool location decides where
//! free-text memos go. The engine never hardcodes any of it; construct one
//! `BookConfig` at startup and thread it through the constructors that need
//! it.

/// Immutable description of one ledger workbook
#[derive(Debug, Clone)]
pub struct BookConfig {
    /// Ordered category names; index `i` lives in row `amount_row + i`
    pub categories: Vec<String>,
    /// Row of the first category in every day column
    pub amount_row: u32,
    /// Row of the first memo slot in every day column
    pub memo_row: u32,
    /// Number of memo slots per day column
    pub memo_slots: usize,
    /// Amounts at or below this are assumed memo-less for the categories
    /// listed in `memo_threshold_categories`
    pub memo_threshold: i64,
    /// Categories whose memos only cover amounts above the threshold
    pub memo_threshold_categories: Vec<String>,
    /// Categories left out of daily totals (typically income rows)
    pub exclude_categories: Vec<String>,
}

impl BookConfig {
    /// Position of a category in the row layout
    pub fn category_index(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == name)
    }

    /// Absolute row of a category's amount cell
    pub fn amount_row_of(&self, name: &str) -> Option<u32> {
        self.category_index(name).map(|i| self.amount_row + i as u32)
    }

    /// Row just past the last category row
    pub fn amount_row_end(&self) -> u32 {
        self.amount_row + self.categories.len() as u32
    }

    /// Whether a category is excluded from totals
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude_categories.iter().any(|c| c == name)
    }

    /// Whether a category follows the memo threshold convention
    pub fn follows_threshold(&self, name: &str) -> bool {
        self.memo_threshold_categories.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    pub fn sample() -> BookConfig {
        BookConfig {
            categories: ["Salary", "Food", "Daily", "Transport", "Special"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            amount_row: 31,
            memo_row: 51,
            memo_slots: 4,
            memo_threshold: 500,
            memo_threshold_categories: vec!["Transport".to_string(), "Special".to_string()],
            exclude_categories: vec!["Salary".to_string()],
        }
    }

    #[test]
    fn row_layout() {
        let config = sample();
        assert_eq!(config.category_index("Salary"), Some(0));
        assert_eq!(config.amount_row_of("Food"), Some(32));
        assert_eq!(config.amount_row_of("Gifts"), None);
        assert_eq!(config.amount_row_end(), 36);
    }

    #[test]
    fn category_flags() {
        let config = sample();
        assert!(config.is_excluded("Salary"));
        assert!(!config.is_excluded("Food"));
        assert!(config.follows_threshold("Transport"));
        assert!(!config.follows_threshold("Daily"));
    }
}
