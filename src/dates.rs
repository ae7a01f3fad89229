//! Date selection for trip requests
//!
//! A trip is either pinned to an exact range picked on a calendar, or left
//! flexible as "N days in some month". Both collapse into the single `dates`
//! string the itinerary service expects:
//!
//! - range: `"2025-06-01 a 2025-06-10"`
//! - flexible: `"10 dias en junio 2025"`

use crate::ValidationError;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Month names as the itinerary service reads them, indexed 0 (enero) to 11 (diciembre)
pub const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

pub const MIN_FLEX_DAYS: u32 = 1;
pub const MAX_FLEX_DAYS: u32 = 30;

/// Day count pre-filled when switching a form to flexible dates
pub const DEFAULT_FLEX_DAYS: u32 = 14;

const ISO_FORMAT: &str = "%Y-%m-%d";

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{4}-\d{2}-\d{2})\s+a\s+(\d{4}-\d{2}-\d{2})\s*$").expect("valid range pattern")
});

static FLEXIBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,3})\s+d[ií]as\s+en\s+(\p{L}+)\s+(\d{4})\s*$").expect("valid flexible pattern")
});

/// How the traveller picked their dates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSelection {
    /// Calendar range; either end may still be unselected
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// `days` days somewhere in `month` (0-based) of `year`
    Flexible { month: u32, year: i32, days: u32 },
}

impl Default for DateSelection {
    fn default() -> Self {
        DateSelection::Range { from: None, to: None }
    }
}

impl DateSelection {
    /// Fully selected calendar range
    pub fn range(from: NaiveDate, to: NaiveDate) -> Self {
        DateSelection::Range {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Flexible selection with a 0-based month index
    pub fn flexible(month: u32, year: i32, days: u32) -> Self {
        DateSelection::Flexible { month, year, days }
    }

    /// Flexible selection starting from a calendar month (1 = January)
    pub fn flexible_calendar_month(month: u32, year: i32, days: u32) -> Result<Self, ValidationError> {
        let index = month
            .checked_sub(1)
            .filter(|m| (*m as usize) < MONTHS_ES.len())
            .ok_or(ValidationError::InvalidMonth(month))?;
        Ok(Self::flexible(index, year, days))
    }

    /// Flexible selection pre-filled for the month containing `today`
    pub fn flexible_from(today: NaiveDate) -> Self {
        Self::flexible(today.month0(), today.year(), DEFAULT_FLEX_DAYS)
    }

    /// Whether enough has been picked to enable submission
    pub fn is_complete(&self) -> bool {
        match self {
            DateSelection::Range { from, to } => from.is_some() && to.is_some(),
            DateSelection::Flexible { month, days, .. } => {
                month_name(*month).is_some() && (MIN_FLEX_DAYS..=MAX_FLEX_DAYS).contains(days)
            }
        }
    }

    /// Build the `dates` field sent to the server
    pub fn compose(&self) -> Result<String, ValidationError> {
        match *self {
            DateSelection::Range { from, to } => {
                let (from, to) = match (from, to) {
                    (Some(from), Some(to)) => (from, to),
                    _ => return Err(ValidationError::MissingDates),
                };
                if from > to {
                    return Err(ValidationError::InvertedRange { from, to });
                }
                Ok(format!("{} a {}", from.format(ISO_FORMAT), to.format(ISO_FORMAT)))
            }
            DateSelection::Flexible { month, year, days } => {
                let month_name = month_name(month).ok_or(ValidationError::InvalidMonth(month))?;
                if !(MIN_FLEX_DAYS..=MAX_FLEX_DAYS).contains(&days) {
                    return Err(ValidationError::FlexibleDaysOutOfRange(days));
                }
                Ok(format!("{} dias en {} {}", days, month_name, year))
            }
        }
    }
}

impl fmt::Display for DateSelection {
    /// Writes nothing for a selection that cannot be composed yet
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.compose() {
            Ok(dates) => f.write_str(&dates),
            Err(_) => Ok(()),
        }
    }
}

impl FromStr for DateSelection {
    type Err = ValidationError;

    /// Parse a `dates` field back into a selection, accepting either shape
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selection = if let Some(captures) = RANGE_RE.captures(s) {
            let from = parse_iso_date(&captures[1])?;
            let to = parse_iso_date(&captures[2])?;
            Self::range(from, to)
        } else if let Some(captures) = FLEXIBLE_RE.captures(s) {
            let days = captures[1]
                .parse::<u32>()
                .map_err(|_| ValidationError::InvalidDates(s.to_string()))?;
            let month = month_index(&captures[2])
                .ok_or_else(|| ValidationError::InvalidDates(s.to_string()))?;
            let year = captures[3]
                .parse::<i32>()
                .map_err(|_| ValidationError::InvalidDates(s.to_string()))?;
            Self::flexible(month, year, days)
        } else {
            return Err(ValidationError::InvalidDates(s.to_string()));
        };

        // Reject ranges and day counts the form itself would refuse
        selection.compose()?;
        Ok(selection)
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), ISO_FORMAT).map_err(|_| ValidationError::InvalidDates(s.to_string()))
}

/// Spanish name for a 0-based month index
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS_ES.get(month as usize).copied()
}

/// 0-based month index for a Spanish month name, ignoring case and the `setiembre` spelling
pub fn month_index(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    let name = if name == "setiembre" { "septiembre" } else { name.as_str() };
    MONTHS_ES.iter().position(|m| *m == name).map(|i| i as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_compose_range() {
        let selection = DateSelection::range(date(2025, 6, 1), date(2025, 6, 10));
        assert_eq!(selection.compose().unwrap(), "2025-06-01 a 2025-06-10");
        assert_eq!(selection.to_string(), "2025-06-01 a 2025-06-10");
    }

    #[test]
    fn test_compose_single_day_range() {
        let selection = DateSelection::range(date(2025, 6, 1), date(2025, 6, 1));
        assert_eq!(selection.compose().unwrap(), "2025-06-01 a 2025-06-01");
    }

    #[test]
    fn test_compose_flexible() {
        let selection = DateSelection::flexible(5, 2025, 10);
        assert_eq!(selection.compose().unwrap(), "10 dias en junio 2025");
    }

    #[test]
    fn test_incomplete_range() {
        let selection = DateSelection::Range {
            from: Some(date(2025, 6, 1)),
            to: None,
        };
        assert!(!selection.is_complete());
        assert_eq!(selection.compose(), Err(ValidationError::MissingDates));
        assert_eq!(selection.to_string(), "");
        assert!(!DateSelection::default().is_complete());
    }

    #[test]
    fn test_inverted_range() {
        let selection = DateSelection::range(date(2025, 6, 10), date(2025, 6, 1));
        assert!(selection.is_complete());
        assert!(matches!(selection.compose(), Err(ValidationError::InvertedRange { .. })));
    }

    #[test]
    fn test_flexible_day_bounds() {
        assert!(DateSelection::flexible(0, 2025, 1).is_complete());
        assert!(DateSelection::flexible(0, 2025, 30).is_complete());
        assert!(!DateSelection::flexible(0, 2025, 0).is_complete());
        assert!(!DateSelection::flexible(0, 2025, 31).is_complete());
        assert_eq!(
            DateSelection::flexible(0, 2025, 31).compose(),
            Err(ValidationError::FlexibleDaysOutOfRange(31))
        );
    }

    #[test]
    fn test_flexible_invalid_month_blocks_submission() {
        assert!(!DateSelection::flexible(12, 2025, 5).is_complete());
        assert!(!DateSelection::flexible(40, 2025, 5).is_complete());
        assert!(DateSelection::flexible(11, 2025, 5).is_complete());
    }

    #[test]
    fn test_flexible_invalid_month() {
        assert_eq!(
            DateSelection::flexible(12, 2025, 5).compose(),
            Err(ValidationError::InvalidMonth(12))
        );
        assert!(DateSelection::flexible_calendar_month(0, 2025, 5).is_err());
        assert!(DateSelection::flexible_calendar_month(13, 2025, 5).is_err());
        assert_eq!(
            DateSelection::flexible_calendar_month(12, 2025, 5).unwrap(),
            DateSelection::flexible(11, 2025, 5)
        );
    }

    #[test]
    fn test_flexible_from_today() {
        let selection = DateSelection::flexible_from(date(2025, 3, 17));
        assert_eq!(selection, DateSelection::flexible(2, 2025, DEFAULT_FLEX_DAYS));
        assert_eq!(selection.compose().unwrap(), "14 dias en marzo 2025");
    }

    #[test]
    fn test_parse_dates_text() {
        let range: DateSelection = "2025-06-01 a 2025-06-10".parse().unwrap();
        assert_eq!(range, DateSelection::range(date(2025, 6, 1), date(2025, 6, 10)));

        let flexible: DateSelection = "10 dias en junio 2025".parse().unwrap();
        assert_eq!(flexible, DateSelection::flexible(5, 2025, 10));

        let accented: DateSelection = "7 días en Setiembre 2026".parse().unwrap();
        assert_eq!(accented, DateSelection::flexible(8, 2026, 7));
    }

    #[test]
    fn test_parse_reuses_patterns() {
        for _ in 0..3 {
            assert!("2025-06-01 a 2025-06-10".parse::<DateSelection>().is_ok());
            assert!("10 dias en junio 2025".parse::<DateSelection>().is_ok());
        }
        assert!(RANGE_RE.is_match(" 2025-06-01 a 2025-06-10 "));
        assert!(FLEXIBLE_RE.is_match("10 Dias EN junio 2025"));
    }

    #[test]
    fn test_parse_rejects_invalid_text() {
        assert!("next summer".parse::<DateSelection>().is_err());
        assert!("2025-13-01 a 2025-13-05".parse::<DateSelection>().is_err());
        assert!("2025-06-10 a 2025-06-01".parse::<DateSelection>().is_err());
        assert!("45 dias en junio 2025".parse::<DateSelection>().is_err());
        assert!("5 dias en brumario 2025".parse::<DateSelection>().is_err());
    }

    #[test]
    fn test_month_lookup() {
        assert_eq!(month_name(0), Some("enero"));
        assert_eq!(month_name(11), Some("diciembre"));
        assert_eq!(month_name(12), None);
        assert_eq!(month_index("Junio"), Some(5));
        assert_eq!(month_index("june"), None);
    }
}
