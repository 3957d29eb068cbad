//! Slot extraction from free-form chat text.
//!
//! Every parser expects pre-lowercased input and tries its patterns in a
//! fixed priority order; the first hit wins.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

use crate::model::ClockTime;

static NEXT_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"next\s+(sunday|monday|tuesday|wednesday|thursday|friday|saturday)").unwrap()
});
static DAY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(sunday|monday|tuesday|wednesday|thursday|friday|saturday)\b").unwrap()
});
static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[/\-.](\d{1,2})(?:[/\-.](\d{2,4}))?").unwrap());
static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+(\d{1,2})(?:st|nd|rd|th)?\b",
    )
    .unwrap()
});

static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"from\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\s+to\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)")
        .unwrap()
});
static TWELVE_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)").unwrap());
static TWENTY_FOUR_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})(?::(\d{2}))?").unwrap());

static COMBINED_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:hour|hr|h)s?(?:\s*and)?\s*(\d+)\s*(?:minute|min|m)s?").unwrap()
});
static HOURS_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:hour|hr|h)s?").unwrap());
static MINUTES_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:minute|min|m)s?").unwrap());
static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)$").unwrap());

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());
static OPTION_PICK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:option\s*)?(\d+)$").unwrap());
static ROOM_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:room\s*)?(\d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeMatch {
    pub start: ClockTime,
    pub end: Option<ClockTime>,
}

const WEEKDAYS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

fn weekday_offset(name: &str, today: NaiveDate) -> i64 {
    let target = WEEKDAYS.iter().position(|d| *d == name).unwrap_or(0) as i64;
    let mut days = target - today.weekday().num_days_from_sunday() as i64;
    if days <= 0 {
        days += 7;
    }
    days
}

/// Resolve a date mention relative to `today`.
///
/// Priority: today/tomorrow, "next <weekday>" (the week after next), a bare
/// weekday (next occurrence), numeric M/D[/Y], then month-name + day with a
/// next-year rollover for dates already past.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.contains("today") {
        return Some(today);
    }
    if text.contains("tomorrow") {
        return today.succ_opt();
    }

    if let Some(caps) = NEXT_DAY.captures(text) {
        let days = weekday_offset(&caps[1], today) + 7;
        return today.checked_add_days(Days::new(days as u64));
    }
    if let Some(caps) = DAY_NAME.captures(text) {
        let days = weekday_offset(&caps[1], today);
        return today.checked_add_days(Days::new(days as u64));
    }

    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = match caps.get(3) {
            Some(y) if y.as_str().len() == 2 => 2000 + y.as_str().parse::<i32>().ok()?,
            Some(y) => y.as_str().parse().ok()?,
            None => today.year(),
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = MONTH_DAY.captures(text) {
        let month = month_number(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
        return if date < today {
            NaiveDate::from_ymd_opt(today.year() + 1, month, day)
        } else {
            Some(date)
        };
    }

    None
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    MONTHS
        .iter()
        .position(|m| name.starts_with(m))
        .map(|i| i as u32 + 1)
}

fn to_24h(hour: u16, period: Option<&str>) -> u16 {
    match period {
        Some("pm") if hour < 12 => hour + 12,
        Some("am") if hour == 12 => 0,
        _ => hour,
    }
}

/// Resolve a start time, optionally with an end time.
///
/// Tries "from X to Y" ranges first, then 12-hour, then 24-hour forms. When a
/// range start omits its meridiem but the end has one, the start leans PM only
/// if that still lands before the end.
pub fn parse_time(text: &str) -> Option<TimeMatch> {
    if let Some(caps) = TIME_RANGE.captures(text) {
        let mut start_hour: u16 = caps[1].parse().ok()?;
        let start_min: u16 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let start_period = caps.get(3).map(|m| m.as_str());
        let end_hour: u16 = caps[4].parse().ok()?;
        let end_min: u16 = caps.get(5).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let end_period = &caps[6];

        start_hour = to_24h(start_hour, start_period);
        let end_hour = to_24h(end_hour, Some(end_period));

        let end_total = end_hour * 60 + end_min;
        if start_period.is_none()
            && start_hour < 12
            && (start_hour + 12) * 60 + start_min < end_total
        {
            start_hour += 12;
        }

        let start_total = start_hour * 60 + start_min;
        if start_total >= end_total {
            return None;
        }
        return Some(TimeMatch {
            start: ClockTime::from_hm(start_hour, start_min),
            end: Some(ClockTime::from_hm(end_hour, end_min)),
        });
    }

    if let Some(caps) = TWELVE_HOUR.captures(text) {
        let hour: u16 = caps[1].parse().ok()?;
        let minute: u16 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        if hour >= 1 && hour <= 12 && minute <= 59 {
            return Some(TimeMatch {
                start: ClockTime::from_hm(to_24h(hour, Some(&caps[3])), minute),
                end: None,
            });
        }
    }

    if let Some(caps) = TWENTY_FOUR_HOUR.captures(text) {
        let hour: u16 = caps[1].parse().ok()?;
        let minute: u16 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        if hour <= 23 && minute <= 59 {
            return Some(TimeMatch {
                start: ClockTime::from_hm(hour, minute),
                end: None,
            });
        }
    }

    None
}

/// Booking length in fractional hours.
pub fn parse_duration(text: &str) -> Option<f64> {
    if let Some(caps) = COMBINED_DURATION.captures(text) {
        let hours: f64 = caps[1].parse().ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        return Some(hours + minutes / 60.0);
    }
    if let Some(caps) = HOURS_DURATION.captures(text) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = MINUTES_DURATION.captures(text) {
        return caps[1].parse::<f64>().ok().map(|m| m / 60.0);
    }
    BARE_NUMBER
        .captures(text.trim())
        .and_then(|caps| caps[1].parse().ok())
}

/// First number anywhere in the text, used for the attendee count.
pub fn parse_count(text: &str) -> Option<u32> {
    FIRST_NUMBER.captures(text).and_then(|c| c[1].parse().ok())
}

/// One-based option pick: the whole message is "3" or "option 3".
pub fn parse_option(text: &str) -> Option<usize> {
    OPTION_PICK
        .captures(text.trim())
        .and_then(|c| c[1].parse().ok())
}

/// A room-number mention, with or without the word "room".
pub fn parse_room_number(text: &str) -> Option<&str> {
    ROOM_NUMBER
        .captures(text)
        .map(|c| c.get(1).unwrap().as_str())
}
