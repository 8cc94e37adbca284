//! Timestamps stamped on memory entries and audit records.
//!
//! Always UTC, always `YYYY-MM-DDTHH:MM:SS.mmmZ`, so plain string order is
//! chronological order for any date after 1970.

use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Milliseconds since the Unix epoch. A clock set before 1970 reads as 0.
pub fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn now_iso8601() -> String {
    unix_millis_to_iso8601(now_unix_millis())
}

pub fn unix_millis_to_iso8601(millis: u64) -> String {
    let (year, month, day) = date_from_epoch_days((millis / MILLIS_PER_DAY) as i64);
    let ms_of_day = millis % MILLIS_PER_DAY;
    let (hh, rest) = (ms_of_day / 3_600_000, ms_of_day % 3_600_000);
    let (mm, rest) = (rest / 60_000, rest % 60_000);
    let (ss, ms) = (rest / 1000, rest % 1000);
    format!("{year:04}-{month:02}-{day:02}T{hh:02}:{mm:02}:{ss:02}.{ms:03}Z")
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
///
/// Counts in 400-year eras starting on March 1st, which puts the leap day at
/// the end of each computed year (Hinnant's `civil_from_days`).
fn date_from_epoch_days(days: i64) -> (i64, u32, u32) {
    const DAYS_PER_ERA: i64 = 146_097;
    let shifted = days + 719_468;
    let era = shifted.div_euclid(DAYS_PER_ERA);
    let day_of_era = shifted.rem_euclid(DAYS_PER_ERA);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_index = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * month_index + 2) / 5 + 1) as u32;
    let month = (if month_index < 10 { month_index + 3 } else { month_index - 9 }) as u32;
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
