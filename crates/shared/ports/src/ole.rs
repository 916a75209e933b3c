use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Automation date: days since 1899-12-30, time of day as the fraction.
///
/// The gateway reports "no time" as zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct OleDate(pub f64);

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl OleDate {
    pub const ZERO: Self = Self(0.0);

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let millis = (dt - epoch()).num_milliseconds();
        Self(millis as f64 / MILLIS_PER_DAY)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// `None` for zero, non-finite or out of range dates
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        if self.is_zero() || !self.0.is_finite() {
            return None;
        }
        let millis = (self.0 * MILLIS_PER_DAY).round();
        if millis.abs() >= i64::MAX as f64 {
            return None;
        }
        epoch().checked_add_signed(Duration::try_milliseconds(millis as i64)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_invalid() {
        assert_eq!(OleDate::ZERO.to_datetime(), None);
        assert_eq!(OleDate(f64::NAN).to_datetime(), None);
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        assert_eq!(OleDate(-1.0e300).to_datetime(), None);
        assert_eq!(OleDate(1.0e300).to_datetime(), None);
        // within i64 millis but beyond chrono's date range
        assert_eq!(OleDate(1.0e9).to_datetime(), None);
        assert_eq!(OleDate(-1.0e9).to_datetime(), None);
    }

    #[test]
    fn test_known_date() {
        // 2015-02-16 12:00 is day 42051.5
        let dt = OleDate(42051.5).to_datetime().unwrap();
        assert_eq!(dt.to_string(), "2015-02-16 12:00:00");
        assert_eq!(OleDate::from_datetime(dt), OleDate(42051.5));
    }
}
