use std::{
    fmt::{self, Display},
    ops::{Add, AddAssign, Sub},
};

use chrono::{Local, Timelike};
use thiserror::Error;

pub(crate) const SECONDS_PER_DAY: i32 = 24 * 60 * 60;

/// Seconds since midnight of the service day.
///
/// Values above one day are legal: GTFS feeds use hours >= 24 for trips that
/// run past midnight, and the router keeps accumulating seconds across days
/// instead of wrapping. Comparisons against the 24-hour clock go through
/// [`Time::wrap_day`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(i32);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid time '{0}', expected HH:MM")]
pub struct InvalidTime(pub String);

impl From<i32> for Time {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Add for Time {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl Sub for Time {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Time {
    pub const fn from_seconds(secs: i32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> i32 {
        self.0
    }

    /// The current wall clock, as seconds since local midnight.
    pub fn now() -> Self {
        Self(Local::now().num_seconds_from_midnight() as i32)
    }

    /// Folds the value back onto the 24-hour clock.
    pub const fn wrap_day(self) -> Self {
        Self(self.0.rem_euclid(SECONDS_PER_DAY))
    }

    /// Parses user input in strict `HH:MM` form, hours 0-23 and minutes 0-59.
    pub fn parse_hhmm(input: &str) -> Result<Self, InvalidTime> {
        let invalid = || InvalidTime(input.to_string());
        let (hours, minutes) = input.split_once(':').ok_or_else(invalid)?;
        if hours.is_empty() || minutes.is_empty() || minutes.contains(':') {
            return Err(invalid());
        }
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
            return Err(invalid());
        }
        Ok(Self(hours * 3600 + minutes * 60))
    }

    /// Parses a GTFS timestamp in `H:MM:SS` form.
    ///
    /// Hours may exceed 23 for after-midnight stop times, so this accepts
    /// values `parse_hhmm` would reject.
    pub fn from_hms(input: &str) -> Option<Self> {
        let mut split = input.split(':');
        let hours: i32 = split.next()?.trim().parse().ok()?;
        let minutes: i32 = split.next()?.parse().ok()?;
        let seconds: i32 = split.next()?.parse().ok()?;
        if split.next().is_some() {
            return None;
        }
        if hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
            return None;
        }
        Some(Self(hours * 3600 + minutes * 60 + seconds))
    }
}

/// Renders `H:MM:SS`, with a day suffix once the value passes midnight.
impl Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / SECONDS_PER_DAY;
        let clock = self.0 % SECONDS_PER_DAY;
        let hours = clock / 3600;
        let minutes = (clock % 3600) / 60;
        let seconds = clock % 60;
        write!(f, "{}:{:02}:{:02}", hours, minutes, seconds)?;
        match days {
            0 => Ok(()),
            1 => write!(f, " the next day"),
            2 => write!(f, " the 2nd day"),
            3 => write!(f, " the 3rd day"),
            n => write!(f, " the {}th day", n),
        }
    }
}

#[test]
fn parse_hhmm_valid() {
    assert_eq!(Time::parse_hhmm("00:00").unwrap().as_seconds(), 0);
    assert_eq!(Time::parse_hhmm("05:00").unwrap().as_seconds(), 18000);
    assert_eq!(Time::parse_hhmm("5:07").unwrap().as_seconds(), 18420);
    assert_eq!(Time::parse_hhmm("23:59").unwrap().as_seconds(), 86340);
}

#[test]
fn parse_hhmm_rejects_out_of_range() {
    assert!(Time::parse_hhmm("24:00").is_err());
    assert!(Time::parse_hhmm("12:60").is_err());
    assert!(Time::parse_hhmm("-1:30").is_err());
}

#[test]
fn parse_hhmm_rejects_malformed() {
    assert!(Time::parse_hhmm("1200").is_err());
    assert!(Time::parse_hhmm("12:").is_err());
    assert!(Time::parse_hhmm(":30").is_err());
    assert!(Time::parse_hhmm("12:3a").is_err());
    assert!(Time::parse_hhmm("12:30:00").is_err());
}

#[test]
fn parse_hhmm_keeps_offending_input() {
    let err = Time::parse_hhmm("25:61").unwrap_err();
    assert_eq!(err.0, "25:61");
}

#[test]
fn from_hms_valid() {
    assert_eq!(Time::from_hms("00:00:30").unwrap().as_seconds(), 30);
    assert_eq!(Time::from_hms("8:00:00").unwrap().as_seconds(), 28800);
    assert_eq!(Time::from_hms("25:35:00").unwrap().as_seconds(), 92100);
}

#[test]
fn from_hms_invalid() {
    assert!(Time::from_hms("00:00").is_none());
    assert!(Time::from_hms("00:00:0a").is_none());
    assert!(Time::from_hms("00:61:00").is_none());
    assert!(Time::from_hms("1:2:3:4").is_none());
}

#[test]
fn display_plain() {
    assert_eq!(Time::from_seconds(5 * 3600).to_string(), "5:00:00");
    assert_eq!(Time::from_seconds(12 * 3600 + 62).to_string(), "12:01:02");
}

#[test]
fn display_day_suffixes() {
    assert_eq!(Time::from_seconds(86400 + 600).to_string(), "0:10:00 the next day");
    assert_eq!(Time::from_seconds(2 * 86400).to_string(), "0:00:00 the 2nd day");
    assert_eq!(Time::from_seconds(3 * 86400 + 60).to_string(), "0:01:00 the 3rd day");
    assert_eq!(Time::from_seconds(4 * 86400).to_string(), "0:00:00 the 4th day");
}

#[test]
fn wrap_day_folds_onto_clock() {
    assert_eq!(Time::from_seconds(86400 + 120).wrap_day().as_seconds(), 120);
    assert_eq!(Time::from_seconds(300).wrap_day().as_seconds(), 300);
}
