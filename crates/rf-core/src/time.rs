//! # Relative Time
//!
//! Turns post timestamps into "5 minutes ago" style labels.
//!
//! Elapsed time is floored to whole seconds and bucketed:
//! under a minute, under an hour, under a day, under a week. Anything a week
//! or older is handed to a [`DistanceFormatter`]. Timestamps in the future
//! land in the "just now" bucket.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::locale::{Locale, YearQualifier};
use crate::traits::DistanceFormatter;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Parses RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) or a bare date.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    debug!(input, "unparseable timestamp");
    Err(FeedError::InvalidTimestamp(input.to_string()))
}

/// Formats with the English locale against the current clock.
pub fn format_relative_time(timestamp: &str) -> Result<String> {
    RelativeTimeFormatter::default().format(timestamp)
}

pub struct RelativeTimeFormatter {
    locale: Locale,
    distance: Box<dyn DistanceFormatter>,
}

impl Default for RelativeTimeFormatter {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl RelativeTimeFormatter {
    pub fn new(locale: Locale) -> Self {
        Self::with_distance(locale, Box::new(CalendarDistance))
    }

    pub fn with_distance(locale: Locale, distance: Box<dyn DistanceFormatter>) -> Self {
        Self { locale, distance }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn format(&self, timestamp: &str) -> Result<String> {
        self.format_at(timestamp, Utc::now())
    }

    pub fn format_at(&self, timestamp: &str, now: DateTime<Utc>) -> Result<String> {
        let date = parse_timestamp(timestamp)?;
        Ok(self.format_datetime_at(date, now))
    }

    pub fn format_datetime_at(&self, date: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let seconds = (now - date).num_milliseconds().div_euclid(1000);

        if seconds < MINUTE {
            self.locale.just_now()
        } else if seconds < HOUR {
            self.locale.minutes_ago(seconds / MINUTE)
        } else if seconds < DAY {
            self.locale.hours_ago(seconds / HOUR)
        } else if seconds < WEEK {
            self.locale.days_ago(seconds / DAY)
        } else {
            self.distance.distance_to_now(date, now, self.locale)
        }
    }
}

/// Default long-range wording: days under a month, then months, then
/// qualified years ("about", "over", "almost").
#[derive(Debug, Default, Clone, Copy)]
pub struct CalendarDistance;

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_MONTH: i64 = 43_200;
const MINUTES_IN_TWO_MONTHS: i64 = 86_400;

/// `n / d` rounded half up. `n` is non-negative and `d` positive.
fn div_round(n: i64, d: i64) -> i64 {
    (n + d / 2) / d
}

impl DistanceFormatter for CalendarDistance {
    fn distance_to_now(&self, date: DateTime<Utc>, now: DateTime<Utc>, locale: Locale) -> String {
        let (earlier, later) = if date <= now { (date, now) } else { (now, date) };
        let minutes = div_round((later - earlier).num_seconds(), 60);

        if minutes < MINUTES_IN_MONTH {
            return locale.days_ago(div_round(minutes, MINUTES_IN_DAY).max(1));
        }
        if minutes < MINUTES_IN_TWO_MONTHS {
            return locale.about_months_ago(div_round(minutes, MINUTES_IN_MONTH));
        }

        let months = calendar_months_between(earlier, later);
        if months < 12 {
            return locale.months_ago(div_round(minutes, MINUTES_IN_MONTH));
        }

        let years = months / 12;
        match months % 12 {
            0..=2 => locale.years_ago(YearQualifier::About, years),
            3..=8 => locale.years_ago(YearQualifier::Over, years),
            _ => locale.years_ago(YearQualifier::Almost, years + 1),
        }
    }
}

/// Whole calendar months from `earlier` to `later`.
fn calendar_months_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let mut months = i64::from(later.year() - earlier.year()) * 12
        + i64::from(later.month()) - i64::from(earlier.month());
    let later_key = (later.day(), later.num_seconds_from_midnight());
    let earlier_key = (earlier.day(), earlier.num_seconds_from_midnight());
    if months > 0 && later_key < earlier_key {
        months -= 1;
    }
    months
}
