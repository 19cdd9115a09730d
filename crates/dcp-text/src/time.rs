//! Subtitle timecodes.
//!
//! A [`Time`] is hours, minutes, seconds and a count of editable units
//! (`e`) at a timecode rate (`tcr`). Two times at different rates compare
//! and combine by cross-multiplying their editable units, so
//! `00:00:01:12` at 24 and `00:00:01:125` at 250 are equal.
//!
//! # Formats
//!
//! | Standard | Form            | Rate      |
//! |----------|-----------------|-----------|
//! | Interop  | `HH:MM:SS.sss`  | 1000      |
//! | Interop  | `HH:MM:SS:EEE`  | 250       |
//! | SMPTE    | `HH:MM:SS:EE`   | caller's  |

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use dcp_core::{Error, Result, Standard};

/// A timecode with editable units at a timecode rate.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    /// Hours.
    pub h: i32,
    /// Minutes.
    pub m: i32,
    /// Seconds.
    pub s: i32,
    /// Editable units within the second.
    pub e: i32,
    /// Timecode rate: editable units per second.
    pub tcr: i32,
}

impl Default for Time {
    fn default() -> Self {
        Self::new(0, 0, 0, 0, 1)
    }
}

impl Time {
    /// Creates a time from its parts.
    pub const fn new(h: i32, m: i32, s: i32, e: i32, tcr: i32) -> Self {
        Self { h, m, s, e, tcr }
    }

    /// Creates a time from a frame index at `frames_per_second`.
    pub fn from_frame(frame: i64, frames_per_second: f64, tcr: i32) -> Self {
        Self::from_seconds(frame as f64 / frames_per_second, tcr)
    }

    /// Creates a time from a number of seconds.
    ///
    /// Editable units are rounded to the nearest unit.
    pub fn from_seconds(seconds: f64, tcr: i32) -> Self {
        let whole = seconds.floor();
        let e = ((seconds - whole) * tcr as f64).round() as i32;

        let mut s = whole as i32;
        let mut m = 0;
        let mut h = 0;
        if s >= 60 {
            m = s / 60;
            s -= m * 60;
        }
        if m >= 60 {
            h = m / 60;
            m -= h * 60;
        }

        Self { h, m, s, e, tcr }
    }

    /// Parses a timecode.
    ///
    /// With `tcr` unset the Interop forms are accepted and the rate comes
    /// from the form (1000 for `HH:MM:SS.sss`, 250 for `HH:MM:SS:EEE`).
    /// With `tcr` set the SMPTE form `HH:MM:SS:EE` is required.
    ///
    /// ```rust
    /// use dcp_text::Time;
    ///
    /// let t = Time::parse("00:01:02:100", None)?;
    /// assert_eq!(t, Time::new(0, 1, 2, 100, 250));
    /// assert_eq!(Time::parse("00:01:02.4", None)?.tcr, 1000);
    /// assert!(Time::parse("00:01:02:100", Some(24)).is_err());
    /// # Ok::<(), dcp_core::Error>(())
    /// ```
    pub fn parse(time: &str, tcr: Option<i32>) -> Result<Self> {
        let unrecognised = || Error::Read(format!("unrecognised time specification {}", time));
        let bad_length = |part: &str| {
            Error::Read(format!(
                "unrecognised time specification {}; {} has bad length",
                time, part
            ))
        };
        let number = |part: &str| part.trim().parse::<i32>().map_err(|_| unrecognised());

        let b: Vec<&str> = time.split(':').collect();
        if b.len() < 3 || b[0].is_empty() || b[1].is_empty() || b[0].len() > 2 || b[1].len() > 2 {
            return Err(unrecognised());
        }

        let h = number(b[0])?;
        let m = number(b[1])?;

        let Some(tcr) = tcr else {
            // Interop
            return match b.len() {
                3 => {
                    let bs: Vec<&str> = b[2].split('.').collect();
                    if bs.len() != 2 {
                        return Err(unrecognised());
                    }
                    if bs[0].is_empty() || bs[0].len() > 2 {
                        return Err(bad_length(bs[0]));
                    }
                    if bs[1].is_empty() || bs[1].len() > 3 {
                        return Err(bad_length(bs[1]));
                    }
                    Ok(Self::new(h, m, number(bs[0])?, number(bs[1])?, 1000))
                }
                4 => {
                    if b[2].is_empty() || b[2].len() > 2 {
                        return Err(bad_length(b[2]));
                    }
                    if b[3].is_empty() || b[3].len() > 3 {
                        return Err(bad_length(b[3]));
                    }
                    Ok(Self::new(h, m, number(b[2])?, number(b[3])?, 250))
                }
                _ => Err(unrecognised()),
            };
        };

        if b.len() != 4 {
            return Err(Error::Read(format!(
                "unrecognised time specification {}; does not have 4 parts",
                time
            )));
        }
        if b[2].is_empty() || b[2].len() > 2 {
            return Err(bad_length(b[2]));
        }
        if b[3].is_empty() || b[3].len() > 2 {
            return Err(bad_length(b[3]));
        }
        Ok(Self::new(h, m, number(b[2])?, number(b[3])?, tcr))
    }

    /// Formats for XML: `HH:MM:SS:EEE` for Interop, `HH:MM:SS:EE` for SMPTE.
    pub fn as_string(&self, standard: Standard) -> String {
        match standard {
            Standard::Smpte => format!("{:02}:{:02}:{:02}:{:02}", self.h, self.m, self.s, self.e),
            Standard::Interop => format!("{:02}:{:02}:{:02}:{:03}", self.h, self.m, self.s, self.e),
        }
    }

    fn whole_seconds(&self) -> i64 {
        self.h as i64 * 3600 + self.m as i64 * 60 + self.s as i64
    }

    /// Total editable units at `tcr`, rounding partial units down.
    pub fn as_editable_units_floor(&self, tcr: i32) -> i64 {
        let units = (self.e as f64 * tcr as f64 / self.tcr as f64).floor() as i64;
        units + self.whole_seconds() * tcr as i64
    }

    /// Total editable units at `tcr`, rounding partial units up.
    pub fn as_editable_units_ceil(&self, tcr: i32) -> i64 {
        let units = (self.e as f64 * tcr as f64 / self.tcr as f64).ceil() as i64;
        units + self.whole_seconds() * tcr as i64
    }

    /// Total seconds.
    pub fn as_seconds(&self) -> f64 {
        self.whole_seconds() as f64 + self.e as f64 / self.tcr as f64
    }

    /// Converts to another timecode rate, rounding to the nearest unit.
    pub fn rebase(&self, tcr: i32) -> Self {
        let mut e = ((self.e as f32) * tcr as f32 / self.tcr as f32).round_ties_even() as i32;
        let mut s = self.s;
        let mut m = self.m;
        let mut h = self.h;
        if e >= tcr {
            e -= tcr;
            s += 1;
        }
        if s >= 60 {
            s -= 60;
            m += 1;
        }
        if m >= 60 {
            m -= 60;
            h += 1;
        }
        Self::new(h, m, s, e, tcr)
    }

    /// Brings two times to a common rate.
    fn common(a: Self, b: Self) -> (i64, i64, i64) {
        if a.tcr == b.tcr {
            (a.e as i64, b.e as i64, a.tcr as i64)
        } else {
            (
                a.e as i64 * b.tcr as i64,
                b.e as i64 * a.tcr as i64,
                a.tcr as i64 * b.tcr as i64,
            )
        }
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.h
            .cmp(&other.h)
            .then(self.m.cmp(&other.m))
            .then(self.s.cmp(&other.s))
            .then_with(|| {
                (self.e as i64 * other.tcr as i64).cmp(&(other.e as i64 * self.tcr as i64))
            })
    }
}

impl Add for Time {
    type Output = Time;

    fn add(self, b: Time) -> Time {
        let (ae, be, tcr) = Time::common(self, b);
        let mut r = Time::new(0, 0, 0, 0, tcr as i32);

        let mut e = ae + be;
        if e >= tcr {
            e -= tcr;
            r.s += 1;
        }
        r.e = e as i32;

        r.s += self.s + b.s;
        if r.s >= 60 {
            r.s -= 60;
            r.m += 1;
        }

        r.m += self.m + b.m;
        if r.m >= 60 {
            r.m -= 60;
            r.h += 1;
        }

        r.h += self.h + b.h;
        r
    }
}

impl Sub for Time {
    type Output = Time;

    fn sub(self, b: Time) -> Time {
        let (ae, be, tcr) = Time::common(self, b);
        let mut r = Time::new(0, 0, 0, 0, tcr as i32);

        let mut e = ae - be;
        if e < 0 {
            e += tcr;
            r.s -= 1;
        }
        r.e = e as i32;

        r.s += self.s - b.s;
        if r.s < 0 {
            r.s += 60;
            r.m -= 1;
        }

        r.m += self.m - b.m;
        if r.m < 0 {
            r.m += 60;
            r.h -= 1;
        }

        r.h += self.h - b.h;
        r
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}.{}", self.h, self.m, self.s, self.e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interop() {
        let t = Time::parse("00:04:09:229", None).unwrap();
        assert_eq!((t.h, t.m, t.s, t.e, t.tcr), (0, 4, 9, 229, 250));

        let t = Time::parse("01:02:03.5", None).unwrap();
        assert_eq!((t.h, t.m, t.s, t.e, t.tcr), (1, 2, 3, 5, 1000));
    }

    #[test]
    fn test_parse_smpte() {
        let t = Time::parse("00:00:05:12", Some(24)).unwrap();
        assert_eq!(t, Time::new(0, 0, 5, 12, 24));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "1:2", "123:00:00:00", "00::00:00", "00:00:00", "00:00:000:00"] {
            assert!(Time::parse(bad, None).is_err(), "{}", bad);
        }
        assert!(Time::parse("00:00:00.1234", None).is_err());
        assert!(Time::parse("00:00:00:1234", None).is_err());
        assert!(Time::parse("00:00:00.1", Some(24)).is_err());

        match Time::parse("00:00:05:123", Some(24)) {
            Err(Error::Read(msg)) => assert!(msg.contains("123 has bad length"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compare_across_rates() {
        let a = Time::new(0, 0, 1, 12, 24);
        let b = Time::new(0, 0, 1, 125, 250);
        assert_eq!(a, b);
        assert!(Time::new(0, 0, 1, 13, 24) > b);
        assert!(Time::new(0, 59, 59, 999, 1000) < Time::new(1, 0, 0, 0, 24));
    }

    #[test]
    fn test_add_sub() {
        let a = Time::new(0, 0, 59, 20, 24);
        let b = Time::new(0, 59, 0, 5, 24);
        let sum = a + b;
        assert_eq!(sum, Time::new(1, 0, 0, 1, 24));
        assert_eq!(sum - b, a);

        let mixed = Time::new(0, 0, 0, 1, 2) + Time::new(0, 0, 0, 1, 4);
        assert_eq!(mixed.tcr, 8);
        assert_eq!(mixed, Time::new(0, 0, 0, 3, 4));
    }

    #[test]
    fn test_as_string() {
        let t = Time::new(1, 2, 3, 4, 24);
        assert_eq!(t.as_string(Standard::Smpte), "01:02:03:04");
        assert_eq!(t.as_string(Standard::Interop), "01:02:03:004");
    }

    #[test]
    fn test_rebase() {
        assert_eq!(Time::new(0, 4, 9, 22, 24).rebase(250), Time::new(0, 4, 9, 229, 250));
        let t = Time::new(0, 59, 59, 249, 250).rebase(24);
        assert_eq!((t.h, t.m, t.s, t.e), (1, 0, 0, 0));
    }

    #[test]
    fn test_editable_units() {
        let t = Time::new(1, 2, 3, 4, 24);
        assert_eq!(t.as_editable_units_ceil(250), 930_792);
        assert_eq!(t.as_editable_units_floor(250), 930_791);
        assert_eq!(Time::new(0, 0, 2, 12, 24).as_editable_units_floor(24), 60);
    }

    #[test]
    fn test_from_seconds() {
        let t = Time::from_seconds(3723.5, 24);
        assert_eq!((t.h, t.m, t.s, t.e, t.tcr), (1, 2, 3, 12, 24));
        assert_eq!(Time::from_frame(48, 24.0, 24), Time::new(0, 0, 2, 0, 24));
        approx::assert_relative_eq!(t.as_seconds(), 3723.5);
    }
}
