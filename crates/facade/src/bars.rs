//! Bars Request Tracker
//!
//! Submits timed bars requests and correlates their asynchronous results
//! by request id. No retry: re-requesting is up to the host.

use std::sync::Arc;

use cqg_core::{BarInfo, Bars, BarsRange, BarsRequest};
use cqg_ports::{
    ErrorRef, Gateway, GwTimedBar, GwTimedBars, GwTimedBarsRequest, OleDate, RangeBound,
    RequestStatus,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, info, warn};

use crate::error::{GwResultExt, Result};

/// Error text of a resolution that is not a success and carries no description
pub const BARS_NOT_SUCCESSFUL: &str = "Bars request failed, cancelled or pending.";

/// What the facade remembers about a submitted request
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBars {
    pub symbol: String,
    pub requested_count: i32,
}

/// Correlation slot for one request id
#[derive(Debug, Clone, PartialEq)]
pub enum BarsSlot {
    /// Submitted and waiting for its resolution
    Requested(PendingBars),
    /// Resolved before the submitting call had recorded it
    Resolved,
}

/// Requests by id: written by the host, drained by the callback thread
pub type PendingBarsMap = Arc<DashMap<String, BarsSlot>>;

/// Record a submitted request unless its resolution already arrived
///
/// Returns `false` when the id was already resolved; the slot is cleared then.
pub fn remember(pending: &PendingBarsMap, request_guid: &str, request: PendingBars) -> bool {
    match pending.entry(request_guid.to_string()) {
        Entry::Occupied(slot) if *slot.get() == BarsSlot::Resolved => {
            slot.remove();
            false
        }
        Entry::Occupied(mut slot) => {
            warn!("Bars request id {} submitted twice", request_guid);
            slot.insert(BarsSlot::Requested(request));
            true
        }
        Entry::Vacant(slot) => {
            slot.insert(BarsSlot::Requested(request));
            true
        }
    }
}

/// Take the pending request for a resolved id, marking unknown ids as resolved
fn take(pending: &PendingBarsMap, request_guid: &str) -> Option<PendingBars> {
    match pending.entry(request_guid.to_string()) {
        Entry::Occupied(slot) => match slot.remove() {
            BarsSlot::Requested(request) => Some(request),
            BarsSlot::Resolved => None,
        },
        Entry::Vacant(slot) => {
            slot.insert(BarsSlot::Resolved);
            None
        }
    }
}

/// Copy a request definition onto a gateway request object
///
/// Only the range pair selected by `use_index_range` is applied; unset date
/// bounds are left at the gateway's default.
pub fn configure_request(request: &mut dyn GwTimedBarsRequest, spec: &BarsRequest) -> Result<()> {
    request.set_symbol(&spec.symbol).describe_with(&*request)?;

    match spec.range() {
        BarsRange::Indices { start, end } => {
            request
                .set_range_start(RangeBound::Index(start))
                .describe_with(&*request)?;
            request
                .set_range_end(RangeBound::Index(end))
                .describe_with(&*request)?;
        }
        BarsRange::Dates { start, end } => {
            if let Some(start) = start {
                request
                    .set_range_start(RangeBound::Date(OleDate::from_datetime(start)))
                    .describe_with(&*request)?;
            }
            if let Some(end) = end {
                request
                    .set_range_end(RangeBound::Date(OleDate::from_datetime(end)))
                    .describe_with(&*request)?;
            }
        }
    }

    request
        .set_intraday_period(spec.intraday_period_in_minutes)
        .describe_with(&*request)?;
    request
        .set_sessions_filter(spec.sessions_filter)
        .describe_with(&*request)?;
    Ok(())
}

/// Submit a request and remember it; returns the correlation id
pub fn request_bars(gateway: &dyn Gateway, spec: &BarsRequest, pending: &PendingBarsMap) -> Result<String> {
    let mut request = gateway.create_timed_bars_request().describe_with(gateway)?;
    configure_request(request.as_mut(), spec)?;

    let bars = gateway
        .request_timed_bars(request.as_ref())
        .describe_with(gateway)?;
    let request_guid = bars.id().describe_with(&*bars)?;

    let request = PendingBars {
        symbol: spec.symbol.clone(),
        requested_count: spec.requested_count(),
    };
    if !remember(pending, &request_guid, request) {
        debug!("Bars {} resolved before submission returned", request_guid);
    }
    info!(
        "Requested bars for {} ({:?}, period {} min), id {}",
        spec.symbol,
        spec.range(),
        spec.intraday_period_in_minutes,
        request_guid
    );
    Ok(request_guid)
}

pub fn bar_info(bar: &dyn GwTimedBar) -> Result<BarInfo> {
    let timestamp = bar.timestamp().describe_with(bar)?;
    Ok(BarInfo {
        timestamp: timestamp.to_datetime().unwrap_or_default(),
        open: bar.open().describe_with(bar)?,
        high: bar.high().describe_with(bar)?,
        low: bar.low().describe_with(bar)?,
        close: bar.close().describe_with(bar)?,
    })
}

/// Result for a resolved request
///
/// The error is the resolution error's description when valid, otherwise a
/// fixed message when the status is not a success. Bars are read only for
/// successful requests.
pub fn resolve(bars: &dyn GwTimedBars, error: Option<&ErrorRef>, pending: &PendingBarsMap) -> Result<Bars> {
    let request_guid = bars.id().describe_with(bars)?;
    let requested = take(pending, &request_guid);
    if requested.is_none() {
        debug!("Bars {} resolved without a pending request", request_guid);
    }

    let mut result = Bars {
        requested_count: requested.map_or(0, |p| p.requested_count),
        request_guid,
        ..Default::default()
    };

    if let Some(error) = error.filter(|e| e.is_valid()) {
        result.error = error.description().describe_with(&**error)?;
    }

    let status = bars.status().describe_with(bars)?;
    if result.error.is_empty() && status != RequestStatus::Success {
        result.error = BARS_NOT_SUCCESSFUL.to_string();
    }

    if result.is_ok() {
        let count = bars.count().describe_with(bars)?;
        result.bars.reserve(count);
        for index in 0..count {
            let bar = bars.item(index).describe_with(bars)?;
            result.bars.push(bar_info(&*bar)?);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cqg_core::{Price, Timestamp};
    use cqg_ports::{GwError, GwObject, GwResult, ResultCode, TimedBarRef};

    #[derive(Default)]
    struct RecordedRequest {
        symbol: String,
        start: Option<RangeBound>,
        end: Option<RangeBound>,
        period: i32,
        sessions: i32,
    }

    impl GwObject for RecordedRequest {}

    impl GwTimedBarsRequest for RecordedRequest {
        fn set_symbol(&mut self, symbol: &str) -> GwResult<()> {
            self.symbol = symbol.to_string();
            Ok(())
        }
        fn set_range_start(&mut self, bound: RangeBound) -> GwResult<()> {
            self.start = Some(bound);
            Ok(())
        }
        fn set_range_end(&mut self, bound: RangeBound) -> GwResult<()> {
            self.end = Some(bound);
            Ok(())
        }
        fn set_intraday_period(&mut self, minutes: i32) -> GwResult<()> {
            self.period = minutes;
            Ok(())
        }
        fn set_sessions_filter(&mut self, filter: i32) -> GwResult<()> {
            self.sessions = filter;
            Ok(())
        }
        fn symbol(&self) -> &str {
            &self.symbol
        }
        fn range_start(&self) -> Option<RangeBound> {
            self.start
        }
        fn range_end(&self) -> Option<RangeBound> {
            self.end
        }
        fn intraday_period(&self) -> i32 {
            self.period
        }
        fn sessions_filter(&self) -> i32 {
            self.sessions
        }
    }

    struct TestBar;

    impl GwObject for TestBar {}

    impl GwTimedBar for TestBar {
        fn timestamp(&self) -> GwResult<OleDate> {
            Ok(OleDate(42051.5))
        }
        fn open(&self) -> GwResult<Price> {
            Ok(1.0)
        }
        fn high(&self) -> GwResult<Price> {
            Ok(2.0)
        }
        fn low(&self) -> GwResult<Price> {
            Ok(0.5)
        }
        fn close(&self) -> GwResult<Price> {
            Ok(1.5)
        }
    }

    struct TestBars {
        status: RequestStatus,
        count: usize,
    }

    impl GwObject for TestBars {}

    impl GwTimedBars for TestBars {
        fn id(&self) -> GwResult<String> {
            Ok("req-1".to_string())
        }
        fn status(&self) -> GwResult<RequestStatus> {
            Ok(self.status)
        }
        fn count(&self) -> GwResult<usize> {
            Ok(self.count)
        }
        fn item(&self, _index: usize) -> GwResult<TimedBarRef> {
            Ok(Arc::new(TestBar))
        }
    }

    struct TestError(&'static str);

    impl GwObject for TestError {}

    impl GwError for TestError {
        fn description(&self) -> GwResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn at(day: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2015, 2, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn pending_for(count: i32) -> PendingBarsMap {
        let pending = PendingBarsMap::default();
        remember(&pending, "req-1", request(count));
        pending
    }

    fn request(count: i32) -> PendingBars {
        PendingBars {
            symbol: "F.US.EPH5".to_string(),
            requested_count: count,
        }
    }

    #[test]
    fn test_index_range_ignores_dates() {
        let mut spec = BarsRequest::last_bars("EP", 48, 5);
        spec.start_date = Some(at(1));
        spec.end_date = Some(at(2));

        let mut request = RecordedRequest::default();
        configure_request(&mut request, &spec).unwrap();

        assert_eq!(request.symbol, "EP");
        assert_eq!(request.start, Some(RangeBound::Index(0)));
        assert_eq!(request.end, Some(RangeBound::Index(-48)));
        assert_eq!(request.period, 5);
        assert_eq!(request.sessions, 31);
    }

    #[test]
    fn test_date_range_ignores_indices() {
        let mut spec = BarsRequest::between("EP", at(1), at(2), 0);
        spec.start_index = 3;
        spec.end_index = -10;

        let mut request = RecordedRequest::default();
        configure_request(&mut request, &spec).unwrap();

        assert_eq!(
            request.start,
            Some(RangeBound::Date(OleDate::from_datetime(at(1))))
        );
        assert_eq!(
            request.end,
            Some(RangeBound::Date(OleDate::from_datetime(at(2))))
        );
    }

    #[test]
    fn test_resolve_success_reads_bars() {
        let pending = pending_for(-48);
        let bars = TestBars {
            status: RequestStatus::Success,
            count: 2,
        };

        let result = resolve(&bars, None, &pending).unwrap();
        assert!(result.is_ok());
        assert_eq!(result.request_guid, "req-1");
        assert_eq!(result.requested_count, -48);
        assert_eq!(result.bars.len(), 2);
        assert_eq!(
            result.bars[0].timestamp.to_string(),
            "2015-02-16 12:00:00"
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn test_resolve_failed_status() {
        let pending = pending_for(-10);
        let bars = TestBars {
            status: RequestStatus::Failed,
            count: 2,
        };

        let result = resolve(&bars, None, &pending).unwrap();
        assert_eq!(result.error, BARS_NOT_SUCCESSFUL);
        assert!(result.bars.is_empty());
    }

    #[test]
    fn test_resolve_error_description_wins() {
        let pending = PendingBarsMap::default();
        let bars = TestBars {
            status: RequestStatus::Failed,
            count: 0,
        };
        let error: ErrorRef = Arc::new(TestError("Unknown symbol"));

        let result = resolve(&bars, Some(&error), &pending).unwrap();
        assert_eq!(result.error, "Unknown symbol");
        assert_eq!(result.requested_count, 0);
    }

    #[test]
    fn test_resolution_before_submission_returns() {
        let pending = PendingBarsMap::default();
        let bars = TestBars {
            status: RequestStatus::Success,
            count: 1,
        };

        let result = resolve(&bars, None, &pending).unwrap();
        assert_eq!(result.requested_count, 0);
        assert_eq!(result.bars.len(), 1);
        assert_eq!(pending.get("req-1").map(|s| s.clone()), Some(BarsSlot::Resolved));

        assert!(!remember(&pending, "req-1", request(-48)));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_resubmitted_id_keeps_latest_request() {
        let pending = pending_for(-10);
        assert!(remember(&pending, "req-1", request(-20)));

        let bars = TestBars {
            status: RequestStatus::Failed,
            count: 0,
        };
        let result = resolve(&bars, None, &pending).unwrap();
        assert_eq!(result.requested_count, -20);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_bar_read_failure_propagates() {
        struct Broken;
        impl GwObject for Broken {}
        impl GwTimedBars for Broken {
            fn id(&self) -> GwResult<String> {
                Ok("req-2".to_string())
            }
            fn status(&self) -> GwResult<RequestStatus> {
                Ok(RequestStatus::Success)
            }
            fn count(&self) -> GwResult<usize> {
                Ok(1)
            }
            fn item(&self, _index: usize) -> GwResult<TimedBarRef> {
                Err(ResultCode::FAIL)
            }
        }

        assert!(resolve(&Broken, None, &PendingBarsMap::default()).is_err());
    }
}
