// Copyright (c) 2020-2021 Swift Navigation Inc.
// Contact: Swift Navigation <dev@swiftnav.com>
//
// This source is subject to the license found in the file 'LICENSE' which must
// be be distributed together with this source. All other rights reserved.
//
// THIS CODE AND INFORMATION IS PROVIDED "AS IS" WITHOUT WARRANTY OF ANY KIND,
// EITHER EXPRESSED OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE IMPLIED
// WARRANTIES OF MERCHANTABILITY AND/OR FITNESS FOR A PARTICULAR PURPOSE.
//! GPS time handling
//!
//! Time throughout this crate is represented as a signed count of
//! nanoseconds since the start of the GPS epoch, 1980-01-06 00:00:00 UTC.
//! Leap seconds are not applied; GPS time runs continuously. [`GpsTime`]
//! provides helpers to split a timestamp into GPS week number and
//! time-of-week, which is how the navigation message and RTCM wire formats
//! represent time.

use std::fmt;
use std::ops::{Add, Sub};

/// Nanoseconds in one second.
pub const NSEC_PER_SEC: i64 = 1_000_000_000;
/// Nanoseconds in one GPS week.
pub const NSEC_PER_WEEK: i64 = NSEC_PER_SEC * WEEK_SECS as i64;
/// Seconds in a GPS week.
pub const WEEK_SECS: u32 = 604_800;
/// Seconds in an hour, used throughout the ephemeris validity window.
pub const HOUR_SECS: i64 = 3_600;

/// An error indicating a duration computation overflowed `i64` nanoseconds.
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, thiserror::Error)]
#[error("GPS time arithmetic overflowed")]
pub struct TimeOverflow;

/// A GPS timestamp, stored as nanoseconds since the GPS epoch.
///
/// Ordering and subtraction are exact integer operations; there is no
/// floating point rounding in comparisons between two [`GpsTime`] values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpsTime(i64);

impl GpsTime {
    /// The earliest representable time, used as a sentinel "not yet
    /// scheduled" deadline by the station driver.
    pub const MIN: GpsTime = GpsTime(i64::MIN);

    /// Makes a [`GpsTime`] directly from a nanosecond count since the GPS
    /// epoch.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> GpsTime {
        GpsTime(nanos)
    }

    /// Makes a [`GpsTime`] from a GPS week number and a time-of-week in
    /// seconds.
    #[must_use]
    pub fn from_week_tow(week: i32, tow_secs: f64) -> GpsTime {
        let week_nanos = i64::from(week) * NSEC_PER_WEEK;
        let tow_nanos = (tow_secs * NSEC_PER_SEC as f64).round() as i64;
        GpsTime(week_nanos + tow_nanos)
    }

    /// Gets the nanosecond count since the GPS epoch.
    #[must_use]
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Gets the GPS week number.
    #[must_use]
    pub fn week(&self) -> i32 {
        self.0.div_euclid(NSEC_PER_WEEK) as i32
    }

    /// Gets the time-of-week in seconds.
    #[must_use]
    pub fn tow_secs(&self) -> f64 {
        self.tow_nanos() as f64 / NSEC_PER_SEC as f64
    }

    /// Gets the time-of-week in whole nanoseconds, in `[0, `[`NSEC_PER_WEEK`]`)`.
    #[must_use]
    pub fn tow_nanos(&self) -> i64 {
        self.0.rem_euclid(NSEC_PER_WEEK)
    }

    /// Gets the time-of-week in milliseconds, rounded to the nearest
    /// millisecond. This is the form the RTCM 1002 header carries.
    #[must_use]
    pub fn tow_millis(&self) -> u32 {
        let ms = (self.tow_nanos() as f64 / 1_000_000.0).round();
        ms as u32
    }

    /// Adds a whole number of seconds, returning a new [`GpsTime`].
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> GpsTime {
        GpsTime(self.0 + secs * NSEC_PER_SEC)
    }

    /// Computes `self - other` as a signed duration in seconds, reducing
    /// the result modulo one GPS week when it exceeds half a week in
    /// magnitude (`|t| > 302400`), per the GPS week-rollover convention
    /// used when evaluating ephemeris transmit-time offsets.
    #[must_use]
    pub fn diff_secs_week_wrapped(&self, other: &GpsTime) -> f64 {
        let mut diff_nanos = self.0 - other.0;
        if diff_nanos > NSEC_PER_WEEK / 2 {
            diff_nanos -= NSEC_PER_WEEK;
        } else if diff_nanos < -NSEC_PER_WEEK / 2 {
            diff_nanos += NSEC_PER_WEEK;
        }
        diff_nanos as f64 / NSEC_PER_SEC as f64
    }
}

impl fmt::Display for GpsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wn={} tow={:.3}", self.week(), self.tow_secs())
    }
}

impl Add<std::time::Duration> for GpsTime {
    type Output = GpsTime;

    fn add(self, rhs: std::time::Duration) -> GpsTime {
        GpsTime(self.0 + rhs.as_nanos() as i64)
    }
}

impl Sub for GpsTime {
    type Output = i64;

    /// Subtracting two [`GpsTime`] values yields the exact signed duration
    /// between them in nanoseconds, with no week-wraparound reduction. Use
    /// [`GpsTime::diff_secs_week_wrapped`] when the operands might
    /// straddle a week boundary (e.g. ephemeris transmit-time offsets).
    fn sub(self, rhs: GpsTime) -> i64 {
        self.0 - rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_tow_round_trip() {
        let t = GpsTime::from_week_tow(2200, 123_456.789);
        assert_eq!(t.week(), 2200);
        assert!((t.tow_secs() - 123_456.789).abs() < 1e-6);
    }

    #[test]
    fn tow_millis_rounds() {
        let t = GpsTime::from_week_tow(100, 10.0005);
        assert_eq!(t.tow_millis(), 10_001);
    }

    #[test]
    fn subtraction_is_exact_nanoseconds() {
        let a = GpsTime::from_nanos(5_000_000_000);
        let b = GpsTime::from_nanos(1_000_000_000);
        assert_eq!(a - b, 4_000_000_000);
    }

    #[test]
    fn week_wrap_reduces_large_offsets() {
        let oe = GpsTime::from_week_tow(100, 604_700.0);
        let xmit = GpsTime::from_week_tow(101, 100.0);
        let t = xmit.diff_secs_week_wrapped(&oe);
        assert!(t > 0.0 && t < 1000.0, "t={t}");
    }

    #[test]
    fn add_secs_reschedules_one_minute() {
        let t = GpsTime::from_week_tow(10, 0.0);
        let next = t.add_secs(60);
        assert!((next.tow_secs() - 60.0).abs() < 1e-9);
    }
}
