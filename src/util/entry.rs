use std::fmt;
use std::ops;

use chrono::NaiveDateTime;

/// An amount of money, in integral currency units
///
/// Ledger cells only ever accumulate whole units, so there is no
/// fractional part to carry around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(pub i64);

impl Amount {
    pub fn zero() -> Self {
        Amount(0)
    }

    pub fn nonzero(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ops::AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl ops::Neg for Amount {
    type Output = Self;
    fn neg(self) -> Self {
        Amount(-self.0)
    }
}

/// One reconstructed or recorded transaction
///
/// This is the row format of the history logs: a wall-clock timestamp,
/// the category name, a free-text memo (possibly empty) and the amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub category: String,
    pub memo: String,
    pub amount: Amount,
}

impl Record {
    pub fn new<C, M>(timestamp: NaiveDateTime, category: C, memo: M, amount: Amount) -> Self
    where
        C: ToString,
        M: ToString,
    {
        Self {
            timestamp,
            category: category.to_string(),
            memo: memo.to_string(),
            amount,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp.date(), self.category)?;
        if !self.memo.is_empty() {
            write!(f, ": {}", self.memo)?;
        }
        write!(f, ", {}", self.amount)
    }
}
