//! Calendar engine
//!
//! Pure functions behind the events calendar: parsing event dates into
//! local calendar days, grouping events per day, and laying out a month as
//! whole Sunday-to-Saturday weeks.

use crate::models::EventPreview;
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

/// Events grouped by `YYYY-MM-DD`
pub type DayBuckets = BTreeMap<String, Vec<EventPreview>>;

/// One day of a month grid, including filler days from adjacent months
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub ymd: String,
    pub events: Vec<EventPreview>,
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Canonical zero-padded `YYYY-MM-DD` key
pub fn to_ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar day of an event date string as seen in `tz`.
///
/// Timestamps with an offset are converted into `tz`; timestamps without
/// one are already wall-clock time; bare dates are taken as-is.
pub fn parse_event_day<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz).date_naive());
    }

    // Offsets without a colon ("+0100") or without seconds
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(tz).date_naive());
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }

    // A bare date names a calendar day, not UTC midnight, so it is never
    // shifted into the previous day west of UTC
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Group events by local calendar day
pub fn bucket_by_day(events: &[EventPreview]) -> DayBuckets {
    bucket_by_day_in(events, &Local)
}

/// Group events by calendar day in `tz`.
///
/// Events whose date does not parse are left out. Each day is sorted by
/// raw date string, then name.
pub fn bucket_by_day_in<Tz: TimeZone>(events: &[EventPreview], tz: &Tz) -> DayBuckets {
    let mut buckets = DayBuckets::new();

    for event in events {
        match parse_event_day(&event.date, tz) {
            Some(day) => buckets.entry(to_ymd(day)).or_default().push(event.clone()),
            None => tracing::debug!(
                "Skipping event {} with unparseable date {:?}",
                event.id,
                event.date
            ),
        }
    }

    for day in buckets.values_mut() {
        day.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    }

    buckets
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// First day of the month `delta` months away from the month of `date`
pub fn add_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let start = month_start(date);
    let shifted = if delta >= 0 {
        start.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        start.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(start)
}

/// Sunday on or before the first of the month
pub fn grid_start(month: NaiveDate) -> NaiveDate {
    let start = month_start(month);
    start
        .checked_sub_days(Days::new(u64::from(start.weekday().num_days_from_sunday())))
        .unwrap_or(start)
}

/// Saturday on or after the last day of the month
pub fn grid_end(month: NaiveDate) -> NaiveDate {
    let end = month_end(month);
    end.checked_add_days(Days::new(u64::from(6 - end.weekday().num_days_from_sunday())))
        .unwrap_or(NaiveDate::MAX)
}

/// Whole-week grid for the month of `month` with events attached per day
pub fn month_grid(month: NaiveDate, buckets: &DayBuckets) -> Vec<CalendarCell> {
    let first = grid_start(month);
    let last = grid_end(month);

    std::iter::successors(Some(first), |date| date.succ_opt())
        .take_while(|date| *date <= last)
        .map(|date| {
            let ymd = to_ymd(date);
            CalendarCell {
                date,
                in_month: date.year() == month.year() && date.month() == month.month(),
                events: buckets.get(&ymd).cloned().unwrap_or_default(),
                ymd,
            }
        })
        .collect()
}
