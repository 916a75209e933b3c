use serde::{Deserialize, Serialize};

use crate::values::{Price, Timestamp};

/// Sessions filter value selecting every session
pub const ALL_SESSIONS: i32 = 31;

/// Sessions filter value selecting the primary session only
pub const PRIMARY_SESSION: i32 = 0;

/// Timed bars request definition.
///
/// `use_index_range` picks which pair of range fields is meaningful; the
/// other pair is ignored even when populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarsRequest {
    pub symbol: String,
    pub use_index_range: bool,
    /// Range start in Line Time
    pub start_date: Option<Timestamp>,
    /// Range end in Line Time
    pub end_date: Option<Timestamp>,
    pub start_index: i32,
    pub end_index: i32,
    /// Bar period in minutes, 0 for daily bars
    pub intraday_period_in_minutes: i32,
    /// Bitmask, [`ALL_SESSIONS`] or [`PRIMARY_SESSION`] for the usual cases
    pub sessions_filter: i32,
}

/// The effective range of a [`BarsRequest`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarsRange {
    Dates {
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    },
    Indices {
        start: i32,
        end: i32,
    },
}

impl BarsRequest {
    /// Request the most recent `count` bars of the given period
    pub fn last_bars(symbol: impl Into<String>, count: i32, period_minutes: i32) -> Self {
        Self {
            symbol: symbol.into(),
            use_index_range: true,
            start_date: None,
            end_date: None,
            start_index: 0,
            end_index: -count,
            intraday_period_in_minutes: period_minutes,
            sessions_filter: ALL_SESSIONS,
        }
    }

    /// Request bars between two Line Time instants
    pub fn between(
        symbol: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
        period_minutes: i32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            use_index_range: false,
            start_date: Some(start),
            end_date: Some(end),
            start_index: 0,
            end_index: 0,
            intraday_period_in_minutes: period_minutes,
            sessions_filter: ALL_SESSIONS,
        }
    }

    pub fn with_sessions_filter(mut self, sessions_filter: i32) -> Self {
        self.sessions_filter = sessions_filter;
        self
    }

    pub fn range(&self) -> BarsRange {
        if self.use_index_range {
            BarsRange::Indices {
                start: self.start_index,
                end: self.end_index,
            }
        } else {
            BarsRange::Dates {
                start: self.start_date,
                end: self.end_date,
            }
        }
    }

    /// Signed bar count; negative means "most recent N", 0 for date ranges
    pub fn requested_count(&self) -> i32 {
        match self.range() {
            BarsRange::Indices { start, end } => end.saturating_sub(start),
            BarsRange::Dates { .. } => 0,
        }
    }

    pub fn is_daily(&self) -> bool {
        self.intraday_period_in_minutes == 0
    }
}

/// One OHLC bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarInfo {
    pub timestamp: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

/// Result of a timed bars request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bars {
    /// Correlates with the id returned at submission
    pub request_guid: String,
    /// Empty on success
    pub error: String,
    /// Signed, may exceed the number actually received
    pub requested_count: i32,
    pub bars: Vec<BarInfo>,
}

impl Bars {
    pub fn is_ok(&self) -> bool {
        self.error.is_empty()
    }

    /// Up to `n` most recent bars
    pub fn last(&self, n: usize) -> &[BarInfo] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2015, 2, 16)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_index_range_ignores_dates() {
        let mut request = BarsRequest::last_bars("EP", 48, 30);
        request.start_date = Some(ts(8));
        request.end_date = Some(ts(16));

        assert_eq!(request.range(), BarsRange::Indices { start: 0, end: -48 });
        assert_eq!(request.requested_count(), -48);
    }

    #[test]
    fn test_date_range_ignores_indices() {
        let mut request = BarsRequest::between("CLE", ts(8), ts(16), 60);
        request.start_index = 3;
        request.end_index = -10;

        assert_eq!(
            request.range(),
            BarsRange::Dates {
                start: Some(ts(8)),
                end: Some(ts(16))
            }
        );
        assert_eq!(request.requested_count(), 0);
    }

    #[test]
    fn test_last_bars_slice() {
        let bar = BarInfo {
            timestamp: ts(9),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
        };
        let bars = Bars {
            bars: vec![bar; 5],
            ..Default::default()
        };

        assert!(bars.is_ok());
        assert_eq!(bars.last(3).len(), 3);
        assert_eq!(bars.last(10).len(), 5);
    }
}
