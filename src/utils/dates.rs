use chrono::NaiveDate;

use crate::utils::error::AppError;

/// Parses a calendar day in the `YYYY-MM-DD` wire format used by the mobile
/// client for meal logging and streak updates.
pub fn parse_day(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", date)))
}

/// Signed day delta `to - from` in whole calendar days.
pub fn day_delta(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_valid() {
        let day = parse_day("2025-03-09").unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        assert!(parse_day("09-03-2025").is_err());
        assert!(parse_day("2025-3-9x").is_err());
        assert!(parse_day("not-a-date").is_err());
        assert!(parse_day("2025-13-01").is_err());
    }

    #[test]
    fn test_day_delta() {
        let a = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(day_delta(a, b), 1);
        assert_eq!(day_delta(b, a), -1);
        assert_eq!(day_delta(a, a), 0);
    }

    #[test]
    fn test_day_delta_across_month_boundary() {
        let a = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(day_delta(a, b), 1);
    }
}
