//! Timestamp utilities

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// UTC timestamp a whole number of days in the future
pub fn days_from_now(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

/// Current UTC calendar date, used to key once-per-day claims
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
