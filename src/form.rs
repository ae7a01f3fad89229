//! Raw trip form input and its normalization into a [`TripRequest`]

use crate::dates::DateSelection;
use crate::{TripRequest, ValidationError};

/// Trip parameters as entered by the traveller, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripForm {
    pub destination: String,
    pub dates: DateSelection,
    /// Budget exactly as typed; blank means "no budget"
    pub budget: Option<String>,
}

impl TripForm {
    pub fn new(destination: impl Into<String>, dates: DateSelection) -> Self {
        Self {
            destination: destination.into(),
            dates,
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = Some(budget.into());
        self
    }

    /// Whether the submit control should be enabled.
    ///
    /// This is the cheap check; [`TripForm::validate`] still runs on submit and
    /// also catches inverted ranges and malformed budgets.
    pub fn can_submit(&self) -> bool {
        !self.destination.trim().is_empty() && self.dates.is_complete()
    }

    /// Validate the form and normalize it into the wire request
    pub fn validate(&self) -> Result<TripRequest, ValidationError> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(ValidationError::EmptyDestination);
        }

        let dates = self.dates.compose()?;
        let budget = parse_budget(self.budget.as_deref())?;

        Ok(TripRequest {
            destination: destination.to_string(),
            dates,
            budget,
        })
    }
}

fn parse_budget(raw: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(Some(amount)),
        _ => Err(ValidationError::InvalidBudget(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn june_range() -> DateSelection {
        DateSelection::range(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        )
    }

    #[test]
    fn test_validate_range_form() {
        let form = TripForm::new("  Tokio ", june_range()).with_budget("1500");
        assert!(form.can_submit());

        let request = form.validate().unwrap();
        assert_eq!(request.destination, "Tokio");
        assert_eq!(request.dates, "2025-06-01 a 2025-06-10");
        assert_eq!(request.budget, Some(1500.0));
    }

    #[test]
    fn test_validate_flexible_form() {
        let form = TripForm::new("París", DateSelection::flexible(5, 2025, 10));
        let request = form.validate().unwrap();
        assert_eq!(request.dates, "10 dias en junio 2025");
        assert_eq!(request.budget, None);
    }

    #[test]
    fn test_blank_destination() {
        let form = TripForm::new("   ", june_range());
        assert!(!form.can_submit());
        assert_eq!(form.validate(), Err(ValidationError::EmptyDestination));
    }

    #[test]
    fn test_flexible_days_gate_submission() {
        for days in [0, 31, 90] {
            let form = TripForm::new("Lisboa", DateSelection::flexible(4, 2025, days));
            assert!(!form.can_submit(), "days = {} should disable submit", days);
            assert_eq!(form.validate(), Err(ValidationError::FlexibleDaysOutOfRange(days)));
        }
    }

    #[test]
    fn test_missing_range_end() {
        let form = TripForm::new(
            "Roma",
            DateSelection::Range {
                from: NaiveDate::from_ymd_opt(2025, 6, 1),
                to: None,
            },
        );
        assert!(!form.can_submit());
        assert_eq!(form.validate(), Err(ValidationError::MissingDates));
    }

    #[test]
    fn test_budget_parsing() {
        assert_eq!(parse_budget(None), Ok(None));
        assert_eq!(parse_budget(Some("")), Ok(None));
        assert_eq!(parse_budget(Some("  ")), Ok(None));
        assert_eq!(parse_budget(Some("0")), Ok(Some(0.0)));
        assert_eq!(parse_budget(Some("99.5")), Ok(Some(99.5)));
        assert!(parse_budget(Some("-1")).is_err());
        assert!(parse_budget(Some("mucho")).is_err());
        assert!(parse_budget(Some("NaN")).is_err());
        assert!(parse_budget(Some("inf")).is_err());
    }

    #[test]
    fn test_negative_budget_rejected() {
        let form = TripForm::new("Oslo", june_range()).with_budget("-200");
        assert!(form.can_submit());
        assert_eq!(
            form.validate(),
            Err(ValidationError::InvalidBudget("-200".to_string()))
        );
    }
}
