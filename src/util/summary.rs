use std::fmt;

use crate::util::{
    config::BookConfig,
    date::Date,
    entry::Amount,
};

/// Aggregated spending for one day column
///
/// Holds one total per category (insertion order follows the configured
/// category list) plus a grand total that skips the excluded categories.
#[derive(Debug, Clone)]
pub struct Summary {
    date: Date,
    items: Vec<(String, Amount)>,
    total: Amount,
}

impl Summary {
    pub fn new(date: Date) -> Self {
        Self {
            date,
            items: Vec::new(),
            total: Amount::zero(),
        }
    }

    /// Fold one evaluated category cell into the summary
    ///
    /// Zero cells are not listed; excluded categories are listed but do not
    /// count towards the total.
    pub fn register(&mut self, config: &BookConfig, category: &str, value: Amount) {
        if !value.nonzero() {
            return;
        }
        self.items.push((category.to_string(), value));
        if !config.is_excluded(category) {
            self.total += value;
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn query(&self, category: &str) -> Amount {
        self.items
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, v)| *v)
            .unwrap_or_else(Amount::zero)
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `12345` -> `"12,345"`
fn group_digits(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date)?;
        for (category, value) in &self.items {
            writeln!(f, "  {}: ¥{}", category, group_digits(value.0))?;
        }
        write!(f, "  total: ¥{}", group_digits(self.total.0))
    }
}
