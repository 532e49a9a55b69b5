use chrono::NaiveDate;

use crate::error::{AppError, Result};

/// Date notations accepted for expiry input. Year-first forms are tried
/// before day-first so `2024-12-31` never parses as day 2024.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse a free-form date string into a canonical calendar date.
///
/// Pure function; no timezone or time-of-day component is modeled.
pub fn normalize_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(AppError::InvalidDateFormat)
}
