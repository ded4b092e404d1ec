//! Day-precise time management for the ledger's addressing scheme
//!
//! Dates are `YYYY-Mmm-DD` triples, not a number of seconds. The spreadsheet
//! uses one sheet per month (named after the month), one column per day
//! (headed by a `YYYY/MM/DD` key), and fiscal years that run April through
//! March, so most of this module exists to move between those conventions.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// A date with day-precision
///
/// Supports years in the range 1000..=9999.
///
/// All methods execute in constant time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date {
    year: u16,
    month: Month,
    day: u8,
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:02}", self.year, self.month, self.day)
    }
}

/// Twelve months in the year, identified by their 3-letter abbreviations
///
/// The abbreviation doubles as the name of the corresponding sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, PartialOrd, Ord)]
pub enum Month {
    Jan = 0,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// Month directly succeeding the current one with wrapping
    pub fn next(self) -> Self {
        Self::from_isize((self as isize + 1) % 12).unwrap()
    }

    /// Month directly preceding the current one with wrapping
    pub fn prev(self) -> Self {
        Self::from_isize((self as isize + 11) % 12).unwrap()
    }

    /// Number of days in this month of the given year
    pub fn count(self, year: u16) -> u8 {
        use Month::*;
        match self {
            Jan | Mar | May | Jul | Aug | Oct | Dec => 31,
            Apr | Jun | Sep | Nov => 30,
            Feb => if is_leap(year) { 29 } else { 28 },
        }
    }

    /// 1-based month number (`Jan` is 1)
    pub fn number(self) -> u32 {
        self as u32 + 1
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Month {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        use Month::*;
        Ok(match s {
            "Jan" => Jan,
            "Feb" => Feb,
            "Mar" => Mar,
            "Apr" => Apr,
            "May" => May,
            "Jun" => Jun,
            "Jul" => Jul,
            "Aug" => Aug,
            "Sep" => Sep,
            "Oct" => Oct,
            "Nov" => Nov,
            "Dec" => Dec,
            _ => return Err(()),
        })
    }
}

/// Ways in which a date taken from user input can be wrong
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateError {
    /// year is outside of 1000..=9999
    UnsupportedYear(usize),
    /// Feb 29 of a non-leap year
    NotBissextile(usize),
    /// Feb 30 or Feb 31 or 31st day of a 30-day month
    MonthTooShort(Month, usize),
    /// day outside of 1..=31
    InvalidDay(usize),
    /// not a YYYY-MM-DD string
    Unreadable(String),
}

impl Date {
    /// Validate year-month-day into date
    pub fn from(year: usize, month: Month, day: usize) -> Result<Self, DateError> {
        if !(1000..=9999).contains(&year) {
            Err(DateError::UnsupportedYear(year))
        } else if day == 0 || day > 31 {
            Err(DateError::InvalidDay(day))
        } else if day <= month.count(year as u16) as usize {
            Ok(Self { year: year as u16, month, day: day as u8 })
        } else if day >= 30 {
            Err(DateError::MonthTooShort(month, day))
        } else {
            Err(DateError::NotBissextile(year))
        }
    }

    /// `self.day` accessor
    pub fn day(&self) -> u8 {
        self.day
    }

    /// `self.month` accessor
    pub fn month(&self) -> Month {
        self.month
    }

    /// `self.year` accessor
    pub fn year(&self) -> u16 {
        self.year
    }

    /// The current local date
    pub fn today() -> Self {
        let now = chrono::Local::now().date_naive();
        // chrono only hands out dates that validate
        Self::from_naive(now).unwrap()
    }

    /// Convert from a chrono date, `None` outside the supported year range
    pub fn from_naive(d: NaiveDate) -> Option<Self> {
        let month = Month::from_u32(d.month() - 1)?;
        Date::from(d.year() as usize, month, d.day() as usize).ok()
    }

    /// Fiscal year this date belongs to
    ///
    /// Fiscal years start in April: `2024-Mar-31` is still fiscal 2023.
    pub fn fiscal_year(self) -> u16 {
        if self.month < Month::Apr {
            self.year - 1
        } else {
            self.year
        }
    }

    /// The content of the header cell of this date's day column, `YYYY/MM/DD`
    pub fn column_key(self) -> String {
        format!("{}/{:02}/{:02}", self.year, self.month.number(), self.day)
    }

    /// Name of the sheet holding this date's column
    pub fn sheet_name(self) -> String {
        self.month.to_string()
    }

    /// This date at 00:00:00, for stamping itemized records
    pub fn midnight(self) -> NaiveDateTime {
        // the triple was validated by `Date::from`
        NaiveDate::from_ymd_opt(self.year as i32, self.month.number(), self.day as u32)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    pub fn next(self) -> Self {
        if self.month.count(self.year) == self.day {
            if self.month == Month::Dec {
                Self { year: self.year + 1, month: Month::Jan, day: 1 }
            } else {
                Self { month: self.month.next(), day: 1, ..self }
            }
        } else {
            Self { day: self.day + 1, ..self }
        }
    }
}

impl FromStr for Date {
    type Err = DateError;

    /// Parse a `YYYY-MM-DD` date
    fn from_str(s: &str) -> Result<Self, DateError> {
        let unreadable = || DateError::Unreadable(s.to_string());
        let mut parts = s.trim().splitn(3, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(unreadable)?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .and_then(|m| m.checked_sub(1))
            .and_then(Month::from_usize)
            .ok_or_else(unreadable)?;
        let day = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(unreadable)?;
        Date::from(year, month, day)
    }
}

/// The twelve (year, month) pairs of a fiscal year, April first
pub fn fiscal_months(fiscal_year: u16) -> Vec<(u16, Month)> {
    (3..12)
        .map(|i| (fiscal_year, Month::from_usize(i).unwrap()))
        .chain((0..3).map(|i| (fiscal_year + 1, Month::from_usize(i).unwrap())))
        .collect()
}

fn is_leap(year: u16) -> bool {
    if year % 400 == 0 {
        true
    } else if year % 100 == 0 {
        false
    } else {
        year % 4 == 0
    }
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DateError::*;
        match self {
            UnsupportedYear(y) => write!(f, "{} is outside of the supported range for years", y),
            NotBissextile(y) => write!(f, "{} is not bissextile, Feb 29 does not exist", y),
            MonthTooShort(m, d) => write!(
                f,
                "{} is a short month, it does not have a {}th day",
                m, d,
            ),
            InvalidDay(d) => write!(f, "{} is not a valid day", d),
            Unreadable(s) => write!(f, "'{}' is not a YYYY-MM-DD date", s),
        }
    }
}
