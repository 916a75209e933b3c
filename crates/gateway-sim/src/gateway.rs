//! Simulated gateway connector
//!
//! Gateway calls queue their notifications; nothing is delivered until the
//! host calls [`SimGateway::pump`], which plays the connector's callback
//! thread. The sink is taken out of its slot while it runs so handlers may
//! call back into the gateway.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::{Duration, NaiveDate};
use cqg_core::{Id, MoneyAmount, Price, Timestamp, Volume};
use cqg_ports::{
    AccountChangeType, AccountRef, AccountSubscriptionLevel, ConnectionStatus, ConnectorConfig,
    ErrorRef, FillRef, FillStatus, Gateway, GwAccount, GwAccounts, GwEnvironment, GwInstrument,
    GwInstruments, GwObject, GwOrderSide, GwOrderType, GwOrders, GwResult, GwTimedBarsRequest,
    InstrumentRef, NewOrder, Notification, NotificationSink, OleDate, OrderChangeType, OrderRef,
    PositionRef, QuoteRef, RangeBound, RawQuoteType, RequestStatus, ResultCode, TimedBarsRef,
};
use log::{debug, info, trace, warn};
use parking_lot::Mutex;

use crate::config::{SimConfig, SimPositionConfig};
use crate::faults::{Faults, SimOp};
use crate::objects::{
    SimAccount, SimAccounts, SimCollection, SimEnvironment, SimError, SimFill, SimFillLeg,
    SimInstrument, SimInstruments, SimOrders, SimPosition, SimQuote, SimTimedBar, SimTimedBars,
    SimTimedBarsRequest,
};
use crate::order::{CreatedOrder, OrderSpec, SimOrder};

/// Filters of the last cancel-all call, `None` meaning "every"
#[derive(Debug, Clone, PartialEq)]
pub struct CancelAllRecord {
    pub gw_account_id: Option<Id>,
    pub symbol: Option<String>,
}

/// Timed bars request as the simulator received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBarsRequest {
    pub symbol: String,
    pub range_start: Option<RangeBound>,
    pub range_end: Option<RangeBound>,
    pub intraday_period: i32,
    pub sessions_filter: i32,
}

impl RecordedBarsRequest {
    fn from_request(request: &dyn GwTimedBarsRequest) -> Self {
        Self {
            symbol: request.symbol().to_string(),
            range_start: request.range_start(),
            range_end: request.range_end(),
            intraday_period: request.intraday_period(),
            sessions_filter: request.sessions_filter(),
        }
    }

    /// Number of bars the range covers, at most `history`
    fn wanted(&self, line_time: OleDate, history: usize) -> usize {
        let span = match (self.range_start, self.range_end) {
            (Some(RangeBound::Index(start)), Some(RangeBound::Index(end))) => {
                end.abs_diff(start) as usize
            }
            (Some(RangeBound::Index(start)), None) => start.unsigned_abs() as usize,
            (Some(RangeBound::Date(start)), end) => {
                let end = match end {
                    Some(RangeBound::Date(end)) => end,
                    _ => line_time,
                };
                let days = (end.0 - start.0).max(0.0);
                if self.intraday_period > 0 {
                    (days * 1440.0 / f64::from(self.intraday_period)) as usize
                } else {
                    days as usize
                }
            }
            _ => history,
        };
        span.min(history)
    }
}

pub(crate) struct SimState {
    pub(crate) config: SimConfig,
    connector_config: Option<ConnectorConfig>,
    started: bool,
    subscription_level: AccountSubscriptionLevel,
    instruments: Vec<Arc<SimInstrument>>,
    subscribed: Vec<Arc<SimInstrument>>,
    accounts: Vec<Arc<SimAccount>>,
    orders: Vec<Arc<SimOrder>>,
    bars: Vec<Arc<SimTimedBars>>,
    pub(crate) line_time: OleDate,
    last_bars_request: Option<RecordedBarsRequest>,
    last_cancel_all: Option<CancelAllRecord>,
    logon: Option<(String, String)>,
    next_order_id: u64,
}

impl SimState {
    fn new(config: SimConfig, shared: &Weak<Shared>) -> Self {
        let instruments = config
            .instruments
            .iter()
            .map(|instrument| Arc::new(SimInstrument::from_config(instrument)))
            .collect();
        let accounts = config
            .accounts
            .iter()
            .map(|account| Arc::new(SimAccount::from_config(account, shared.clone())))
            .collect();
        let line_time = config
            .line_time
            .map(OleDate::from_datetime)
            .unwrap_or(OleDate::ZERO);

        Self {
            config,
            connector_config: None,
            started: false,
            subscription_level: AccountSubscriptionLevel::None,
            instruments,
            subscribed: Vec::new(),
            accounts,
            orders: Vec::new(),
            bars: Vec::new(),
            line_time,
            last_bars_request: None,
            last_cancel_all: None,
            logon: None,
            next_order_id: 1,
        }
    }

    fn instrument(&self, symbol: &str) -> Option<Arc<SimInstrument>> {
        self.instruments
            .iter()
            .find(|instrument| instrument.matches(symbol))
            .cloned()
    }

    fn account(&self, gw_account_id: Id) -> Option<Arc<SimAccount>> {
        self.accounts
            .iter()
            .find(|account| account.gw_account_id == gw_account_id)
            .cloned()
    }

    fn order(&self, guid: &str) -> Option<Arc<SimOrder>> {
        self.orders.iter().find(|order| order.guid == guid).cloned()
    }

    fn next_order_id(&mut self) -> String {
        let id = format!("SIM-{}", self.next_order_id);
        self.next_order_id += 1;
        id
    }

    /// End of the synthetic bar series
    fn bars_end(&self) -> Timestamp {
        self.line_time.to_datetime().unwrap_or_else(|| {
            NaiveDate::from_ymd_opt(2015, 2, 16)
                .and_then(|d| d.and_hms_opt(16, 0, 0))
                .unwrap_or_default()
        })
    }
}

/// State reachable from the objects the simulator hands out
pub(crate) struct Shared {
    pub(crate) state: Mutex<SimState>,
    queue: Mutex<VecDeque<Notification>>,
    faults: Mutex<Faults>,
}

impl Shared {
    /// Fail when a fault is armed for `op`
    pub(crate) fn check(&self, op: SimOp) -> GwResult<()> {
        let result = self.faults.lock().check(op);
        if let Err(code) = result {
            debug!("[sim] {:?} failed with injected {:?}", op, code);
        }
        result
    }

    pub(crate) fn error_description(&self) -> Option<String> {
        self.faults.lock().last_description()
    }

    pub(crate) fn notify(&self, notification: Notification) {
        trace!("[sim] queued {:?}", notification);
        self.queue.lock().push_back(notification);
    }

    pub(crate) fn notify_order(
        &self,
        change: OrderChangeType,
        order: OrderRef,
        fill: Option<FillRef>,
        error: Option<ErrorRef>,
    ) {
        self.notify(Notification::OrderChanged {
            change,
            order,
            fill,
            error,
        });
    }

    pub(crate) fn fills_market_orders(&self) -> bool {
        self.state.lock().config.fill_market_orders
    }

    pub(crate) fn fill_at_market(&self, order: &SimOrder) -> GwResult<()> {
        let price = self
            .state
            .lock()
            .instrument(order.symbol())
            .and_then(|instrument| instrument.trade_price());
        let Some(price) = price else {
            warn!("[sim] no trade price for {}, market order left working", order.symbol());
            return Ok(());
        };
        let leg = SimFillLeg::new(order.symbol(), price, order.remaining());
        self.fill(order, FillStatus::Normal, vec![leg])
    }

    pub(crate) fn fill(&self, order: &SimOrder, status: FillStatus, legs: Vec<SimFillLeg>) -> GwResult<()> {
        let quantity: Volume = legs.iter().map(|leg| leg.quantity).sum();
        order.apply_fill(if status.voids_legs() { -quantity } else { quantity });

        let fill: FillRef = Arc::new(SimFill { status, legs });
        self.notify_order(OrderChangeType::Changed, order.order_ref()?, Some(fill), None);
        Ok(())
    }

    /// Placed orders, optionally narrowed to an account and to internal ones
    pub(crate) fn order_collection(
        self: &Arc<Self>,
        gw_account_id: Option<Id>,
        internal_only: bool,
    ) -> GwResult<Arc<dyn GwOrders>> {
        self.check(SimOp::Orders)?;
        let fail_at = self.faults.lock().take_enumeration();
        let orders = self
            .state
            .lock()
            .orders
            .iter()
            .filter(|order| order.is_placed())
            .filter(|order| gw_account_id.is_none_or(|id| order.gw_account_id() == id))
            .filter(|order| !internal_only || order.is_internal())
            .cloned()
            .collect();

        Ok(Arc::new(SimOrders {
            orders: SimCollection::new(orders, Arc::downgrade(self)).failing_at(fail_at),
        }))
    }

    fn resolve_bars(&self, bars: &SimTimedBars, request: &RecordedBarsRequest) {
        let (instrument, wanted, end) = {
            let state = self.state.lock();
            (
                state.instrument(&request.symbol),
                request.wanted(state.line_time, state.config.bar_history),
                state.bars_end(),
            )
        };

        let error: Option<ErrorRef> = match instrument {
            Some(instrument) => {
                let base = instrument.trade_price().unwrap_or(100.0);
                let series = synthetic_bars(wanted, request.intraday_period, end, base);
                debug!("[sim] resolving bars {} with {} bars", bars.id, series.len());
                bars.complete(RequestStatus::Success, series);
                None
            }
            None => {
                bars.complete(RequestStatus::Failed, Vec::new());
                Some(Arc::new(SimError {
                    description: format!("Unknown symbol {}", request.symbol),
                }))
            }
        };

        self.notify(Notification::TimedBarsResolved {
            bars: self.bars_ref(&bars.id),
            error,
        });
    }

    fn bars_ref(&self, id: &str) -> TimedBarsRef {
        let state = self.state.lock();
        match state.bars.iter().find(|bars| bars.id == id) {
            Some(bars) => Arc::clone(bars) as TimedBarsRef,
            None => Arc::new(SimTimedBars::new(id.to_string(), String::new())),
        }
    }
}

/// Gently oscillating OHLC series ending at `end`, oldest first
fn synthetic_bars(count: usize, period_minutes: i32, end: Timestamp, base: Price) -> Vec<Arc<SimTimedBar>> {
    let step = if period_minutes > 0 {
        Duration::minutes(i64::from(period_minutes))
    } else {
        Duration::days(1)
    };

    (0..count)
        .map(|i| {
            let back = i32::try_from(count - 1 - i).unwrap_or(i32::MAX);
            let open = base + ((i % 4) as f64 - 1.5) * 0.25;
            let close = base + (((i + 1) % 4) as f64 - 1.5) * 0.25;
            Arc::new(SimTimedBar {
                timestamp: OleDate::from_datetime(end - step * back),
                open,
                high: open.max(close) + 0.25,
                low: open.min(close) - 0.25,
                close,
            })
        })
        .collect()
}

/// In-process gateway connector driven by the host
pub struct SimGateway {
    shared: Arc<Shared>,
    sink: Mutex<Option<Box<dyn NotificationSink>>>,
    advised: AtomicBool,
}

impl SimGateway {
    pub fn new(config: SimConfig) -> Arc<Self> {
        let shared = Arc::new_cyclic(|weak| Shared {
            state: Mutex::new(SimState::new(config, weak)),
            queue: Mutex::new(VecDeque::new()),
            faults: Mutex::new(Faults::default()),
        });
        Arc::new(Self {
            shared,
            sink: Mutex::new(None),
            advised: AtomicBool::new(false),
        })
    }

    /// Factory handing out this gateway
    pub fn factory(self: &Arc<Self>) -> impl Fn() -> GwResult<Arc<dyn Gateway>> + Send + 'static {
        let gateway = Arc::clone(self);
        move || {
            gateway.shared.check(SimOp::Create)?;
            Ok(Arc::clone(&gateway) as Arc<dyn Gateway>)
        }
    }

    /// Deliver queued notifications in order; returns how many reached the sink
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        loop {
            let Some(notification) = self.shared.queue.lock().pop_front() else {
                break;
            };
            let Some(mut sink) = self.sink.lock().take() else {
                trace!("[sim] dropped {:?}, no sink", notification);
                continue;
            };

            sink.on_notification(self, notification);
            delivered += 1;

            let mut slot = self.sink.lock();
            if self.advised.load(Ordering::SeqCst) && slot.is_none() {
                *slot = Some(sink);
            }
        }
        delivered
    }

    pub fn pending_notifications(&self) -> usize {
        self.shared.queue.lock().len()
    }

    // -- fault injection ----------------------------------------------------

    pub fn fail_next(&self, op: SimOp, code: ResultCode) {
        self.shared.faults.lock().fail_next(op, code, None);
    }

    /// Like [`SimGateway::fail_next`], with a rich error description
    pub fn fail_next_with(&self, op: SimOp, code: ResultCode, description: impl Into<String>) {
        self.shared
            .faults
            .lock()
            .fail_next(op, code, Some(description.into()));
    }

    /// Next order enumeration yields an error at `index`
    pub fn fail_enumeration_at(&self, index: usize, code: ResultCode) {
        self.shared.faults.lock().fail_enumeration_at(index, code);
    }

    // -- scenario drivers ---------------------------------------------------

    pub fn set_market_data_status(&self, status: ConnectionStatus) {
        self.shared.notify(Notification::DataConnectionChanged(status));
    }

    pub fn set_trading_status(&self, status: ConnectionStatus) {
        self.shared.notify(Notification::GatewayConnectionChanged(status));
    }

    pub fn data_error(&self, description: impl Into<String>) {
        self.shared.notify(Notification::DataError {
            description: description.into(),
        });
    }

    pub fn set_line_time(&self, line_time: Option<Timestamp>) {
        self.shared.state.lock().line_time =
            line_time.map(OleDate::from_datetime).unwrap_or(OleDate::ZERO);
    }

    /// Update quotes of a known instrument and notify the changed ones
    pub fn push_quotes(&self, symbol: &str, quotes: &[(RawQuoteType, Price, Volume)]) -> GwResult<()> {
        let instrument = self
            .shared
            .state
            .lock()
            .instrument(symbol)
            .ok_or(ResultCode::INVALID_ARG)?;
        let changed: Vec<Arc<SimQuote>> = quotes
            .iter()
            .map(|&(raw, price, volume)| SimQuote::new(raw, price, volume))
            .collect();
        instrument.update_quotes(&changed);

        let quotes = changed
            .into_iter()
            .map(|quote| quote as QuoteRef)
            .collect();
        self.shared.notify(Notification::InstrumentChanged {
            instrument: instrument as InstrumentRef,
            quotes: Some(Arc::new(SimCollection::new(quotes, Weak::new()))),
        });
        Ok(())
    }

    pub fn reload_accounts(&self) {
        for change in [
            AccountChangeType::AccountsReloaded,
            AccountChangeType::PositionsReloaded,
        ] {
            self.shared.notify(Notification::AccountChanged {
                change,
                account: None,
                position: None,
            });
        }
    }

    pub fn change_account(
        &self,
        gw_account_id: Id,
        balance: MoneyAmount,
        ote: MoneyAmount,
        profit_loss: MoneyAmount,
    ) -> GwResult<()> {
        let account = self.account(gw_account_id)?;
        account.set_money(balance, ote, profit_loss);
        self.shared.notify(Notification::AccountChanged {
            change: AccountChangeType::AccountChanged,
            account: Some(account as AccountRef),
            position: None,
        });
        Ok(())
    }

    pub fn update_position(&self, gw_account_id: Id, position: SimPositionConfig) -> GwResult<()> {
        let account = self.account(gw_account_id)?;
        let position = SimPosition::new(position);
        let change = if account.upsert_position(Arc::clone(&position)) {
            AccountChangeType::PositionAdded
        } else {
            AccountChangeType::PositionChanged
        };
        self.shared.notify(Notification::AccountChanged {
            change,
            account: Some(account as AccountRef),
            position: Some(position as PositionRef),
        });
        Ok(())
    }

    pub fn fill_order(&self, guid: &str, quantity: Volume, price: Price) -> GwResult<()> {
        let order = self.order(guid)?;
        let leg = SimFillLeg::new(order.symbol(), price, quantity);
        self.shared.fill(&order, FillStatus::Normal, vec![leg])
    }

    pub fn fill_order_legs(&self, guid: &str, status: FillStatus, legs: Vec<SimFillLeg>) -> GwResult<()> {
        let order = self.order(guid)?;
        self.shared.fill(&order, status, legs)
    }

    /// Reject a working order with an error description
    pub fn reject_order(&self, guid: &str, description: impl Into<String>) -> GwResult<()> {
        let order = self.order(guid)?;
        order.finish();
        let error: ErrorRef = Arc::new(SimError {
            description: description.into(),
        });
        self.shared
            .notify_order(OrderChangeType::Changed, order.order_ref()?, None, Some(error));
        Ok(())
    }

    /// Report an arbitrary status, as a misbehaving connector might
    pub fn report_order(&self, guid: &str, is_final: bool, filled: i64) -> GwResult<()> {
        let order = self.order(guid)?;
        order.force(is_final, filled);
        self.shared
            .notify_order(OrderChangeType::Changed, order.order_ref()?, None, None);
        Ok(())
    }

    /// Drop an order from the gateway's books
    pub fn remove_order(&self, guid: &str) -> GwResult<()> {
        let order = self.order(guid)?;
        order.finish();
        self.shared
            .notify_order(OrderChangeType::Removed, order.order_ref()?, None, None);
        Ok(())
    }

    /// Working order placed outside this connection
    pub fn add_external_order(
        &self,
        gw_account_id: Id,
        symbol: &str,
        buy: bool,
        quantity: i64,
    ) -> GwResult<String> {
        let order = {
            let mut state = self.shared.state.lock();
            let account = state
                .account(gw_account_id)
                .ok_or(ResultCode::INVALID_ARG)?;
            let instrument = state.instrument(symbol).ok_or(ResultCode::INVALID_ARG)?;
            let spec = OrderSpec {
                gw_order_id: state.next_order_id(),
                order_type: GwOrderType::Limit,
                symbol: instrument.full_name.clone(),
                account: account as AccountRef,
                gw_account_id,
                side: if buy {
                    GwOrderSide::Buy
                } else {
                    GwOrderSide::Sell
                },
                quantity,
                limit_price: instrument.trade_price().unwrap_or_default(),
                stop_price: 0.0,
                internal: false,
            };
            let order = SimOrder::new(spec, Arc::downgrade(&self.shared));
            order.mark_placed();
            state.orders.push(Arc::clone(&order));
            order
        };

        self.shared
            .notify_order(OrderChangeType::Added, order.order_ref()?, None, None);
        Ok(order.guid.clone())
    }

    /// Resolve a pending bars request by id
    pub fn resolve_bars(&self, id: &str) -> GwResult<()> {
        let (bars, request) = self.pending_bars(id)?;
        self.shared.resolve_bars(&bars, &request);
        Ok(())
    }

    pub fn fail_bars(&self, id: &str, status: RequestStatus, description: Option<&str>) -> GwResult<()> {
        let (bars, _) = self.pending_bars(id)?;
        bars.complete(status, Vec::new());
        let error = description.map(|description| {
            Arc::new(SimError {
                description: description.to_string(),
            }) as ErrorRef
        });
        self.shared.notify(Notification::TimedBarsResolved {
            bars: bars as TimedBarsRef,
            error,
        });
        Ok(())
    }

    // -- inspection ---------------------------------------------------------

    pub fn is_advised(&self) -> bool {
        self.advised.load(Ordering::SeqCst)
    }

    pub fn is_started(&self) -> bool {
        self.shared.state.lock().started
    }

    pub fn connector_config(&self) -> Option<ConnectorConfig> {
        self.shared.state.lock().connector_config.clone()
    }

    pub fn subscription_level(&self) -> AccountSubscriptionLevel {
        self.shared.state.lock().subscription_level
    }

    pub fn logon_credentials(&self) -> Option<(String, String)> {
        self.shared.state.lock().logon.clone()
    }

    pub fn created_orders(&self) -> Vec<CreatedOrder> {
        self.shared
            .state
            .lock()
            .orders
            .iter()
            .map(|order| order.snapshot())
            .collect()
    }

    pub fn created_order(&self, guid: &str) -> Option<CreatedOrder> {
        self.shared.state.lock().order(guid).map(|order| order.snapshot())
    }

    pub fn last_cancel_all(&self) -> Option<CancelAllRecord> {
        self.shared.state.lock().last_cancel_all.clone()
    }

    pub fn last_bars_request(&self) -> Option<RecordedBarsRequest> {
        self.shared.state.lock().last_bars_request.clone()
    }

    fn account(&self, gw_account_id: Id) -> GwResult<Arc<SimAccount>> {
        self.shared
            .state
            .lock()
            .account(gw_account_id)
            .ok_or(ResultCode::INVALID_ARG)
    }

    fn order(&self, guid: &str) -> GwResult<Arc<SimOrder>> {
        self.shared
            .state
            .lock()
            .order(guid)
            .ok_or(ResultCode::INVALID_ARG)
    }

    fn pending_bars(&self, id: &str) -> GwResult<(Arc<SimTimedBars>, RecordedBarsRequest)> {
        let state = self.shared.state.lock();
        let bars = state
            .bars
            .iter()
            .find(|bars| bars.id == id)
            .cloned()
            .ok_or(ResultCode::INVALID_ARG)?;
        let request = RecordedBarsRequest {
            symbol: bars.symbol.clone(),
            ..state
                .last_bars_request
                .clone()
                .filter(|request| request.symbol == bars.symbol)
                .unwrap_or(RecordedBarsRequest {
                    symbol: String::new(),
                    range_start: Some(RangeBound::Index(0)),
                    range_end: Some(RangeBound::Index(-10)),
                    intraday_period: 1,
                    sessions_filter: 0,
                })
        };
        Ok((bars, request))
    }
}

impl GwObject for SimGateway {
    fn supports_error_info(&self) -> bool {
        true
    }

    fn error_description(&self) -> Option<String> {
        self.shared.error_description()
    }
}

impl Gateway for SimGateway {
    fn configure(&self, config: &ConnectorConfig) -> GwResult<()> {
        self.shared.check(SimOp::Configure)?;
        self.shared.state.lock().connector_config = Some(config.clone());
        Ok(())
    }

    fn advise(&self, sink: Box<dyn NotificationSink>) -> GwResult<()> {
        self.shared.check(SimOp::Advise)?;
        *self.sink.lock() = Some(sink);
        self.advised.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unadvise(&self) -> GwResult<()> {
        self.advised.store(false, Ordering::SeqCst);
        self.sink.lock().take();
        Ok(())
    }

    fn startup(&self) -> GwResult<()> {
        self.shared.check(SimOp::Startup)?;
        let (auto_connect, deliver) = {
            let mut state = self.shared.state.lock();
            state.started = true;
            (state.config.auto_connect, state.config.deliver_on_startup)
        };
        info!("[sim] gateway started");
        if auto_connect {
            self.set_market_data_status(ConnectionStatus::Up);
            self.set_trading_status(ConnectionStatus::Down);
        }
        if deliver {
            self.pump();
        }
        Ok(())
    }

    fn shutdown(&self) -> GwResult<()> {
        self.shared.state.lock().started = false;
        info!("[sim] gateway shut down");
        Ok(())
    }

    fn set_account_subscription_level(&self, level: AccountSubscriptionLevel) -> GwResult<()> {
        self.shared.check(SimOp::SubscribeAccounts)?;
        self.shared.state.lock().subscription_level = level;
        if level != AccountSubscriptionLevel::None {
            self.reload_accounts();
        }
        Ok(())
    }

    fn new_instrument(&self, symbol: &str) -> GwResult<()> {
        self.shared.check(SimOp::NewInstrument)?;
        let instrument = {
            let mut state = self.shared.state.lock();
            let instrument = state.instrument(symbol);
            if let Some(instrument) = &instrument {
                if !state.subscribed.iter().any(|s| Arc::ptr_eq(s, instrument)) {
                    state.subscribed.push(Arc::clone(instrument));
                }
            }
            instrument
        };

        self.shared.notify(match instrument {
            Some(instrument) => Notification::InstrumentSubscribed {
                symbol: symbol.to_string(),
                instrument: instrument as InstrumentRef,
            },
            None => Notification::IncorrectSymbol {
                symbol: symbol.to_string(),
            },
        });
        Ok(())
    }

    fn instruments(&self) -> GwResult<Arc<dyn GwInstruments>> {
        self.shared.check(SimOp::Instruments)?;
        Ok(Arc::new(SimInstruments {
            instruments: self.shared.state.lock().subscribed.clone(),
        }))
    }

    fn accounts(&self) -> GwResult<Arc<dyn GwAccounts>> {
        self.shared.check(SimOp::Accounts)?;
        Ok(Arc::new(SimAccounts {
            accounts: SimCollection::new(
                self.shared.state.lock().accounts.clone(),
                Arc::downgrade(&self.shared),
            ),
        }))
    }

    fn orders(&self) -> GwResult<Arc<dyn GwOrders>> {
        self.shared.order_collection(None, false)
    }

    fn internal_orders(&self) -> GwResult<Arc<dyn GwOrders>> {
        self.shared.order_collection(None, true)
    }

    fn create_order(&self, order: &NewOrder<'_>) -> GwResult<OrderRef> {
        self.shared.check(SimOp::CreateOrder)?;
        if order.quantity == 0 {
            return Err(ResultCode::INVALID_ARG);
        }
        let needs_limit = matches!(order.order_type, GwOrderType::Limit | GwOrderType::StopLimit);
        let needs_stop = matches!(order.order_type, GwOrderType::Stop | GwOrderType::StopLimit);
        if (needs_limit && order.limit_price <= 0.0) || (needs_stop && order.stop_price <= 0.0) {
            return Err(ResultCode::INVALID_ARG);
        }

        let symbol = order.instrument.full_name()?;
        let gw_account_id = order.account.gw_account_id()?;
        let mut state = self.shared.state.lock();
        let spec = OrderSpec {
            gw_order_id: state.next_order_id(),
            order_type: order.order_type,
            symbol,
            account: Arc::clone(order.account),
            gw_account_id,
            side: order.side,
            quantity: i64::from(order.quantity),
            limit_price: order.limit_price,
            stop_price: order.stop_price,
            internal: true,
        };
        let created = SimOrder::new(spec, Arc::downgrade(&self.shared));
        state.orders.push(Arc::clone(&created));
        Ok(created as OrderRef)
    }

    fn cancel_all_orders(
        &self,
        account: Option<&AccountRef>,
        instrument: Option<&InstrumentRef>,
    ) -> GwResult<()> {
        self.shared.check(SimOp::CancelAll)?;
        let record = CancelAllRecord {
            gw_account_id: account.map(|a| a.gw_account_id()).transpose()?,
            symbol: instrument.map(|i| i.full_name()).transpose()?,
        };

        let matching: Vec<Arc<SimOrder>> = {
            let mut state = self.shared.state.lock();
            let matching = state
                .orders
                .iter()
                .filter(|order| order.is_working())
                .filter(|order| record.gw_account_id.is_none_or(|id| order.gw_account_id() == id))
                .filter(|order| record.symbol.as_deref().is_none_or(|s| order.symbol() == s))
                .cloned()
                .collect();
            state.last_cancel_all = Some(record);
            matching
        };

        debug!("[sim] cancel all matched {} orders", matching.len());
        for order in matching {
            if order.finish() {
                self.shared
                    .notify_order(OrderChangeType::Changed, order.order_ref()?, None, None);
            }
        }
        Ok(())
    }

    fn create_timed_bars_request(&self) -> GwResult<Box<dyn GwTimedBarsRequest>> {
        self.shared.check(SimOp::CreateBarsRequest)?;
        Ok(Box::new(SimTimedBarsRequest::default()))
    }

    fn request_timed_bars(&self, request: &dyn GwTimedBarsRequest) -> GwResult<TimedBarsRef> {
        self.shared.check(SimOp::RequestBars)?;
        let recorded = RecordedBarsRequest::from_request(request);
        let bars = Arc::new(SimTimedBars::new(
            uuid::Uuid::new_v4().to_string(),
            recorded.symbol.clone(),
        ));

        let auto_resolve = {
            let mut state = self.shared.state.lock();
            state.bars.push(Arc::clone(&bars));
            state.last_bars_request = Some(recorded.clone());
            state.config.resolve_bars
        };
        if auto_resolve {
            self.shared.resolve_bars(&bars, &recorded);
        }
        Ok(bars as TimedBarsRef)
    }

    fn environment(&self) -> GwResult<Arc<dyn GwEnvironment>> {
        self.shared.check(SimOp::Environment)?;
        Ok(Arc::new(SimEnvironment {
            shared: Arc::downgrade(&self.shared),
        }))
    }

    fn gw_logon(&self, user: &str, password: &str) -> GwResult<()> {
        self.shared.check(SimOp::Logon)?;
        let started = {
            let mut state = self.shared.state.lock();
            state.logon = Some((user.to_string(), password.to_string()));
            state.started
        };
        info!("[sim] logon as {}", user);
        if started {
            self.set_trading_status(ConnectionStatus::Up);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqg_ports::{ForeignCollection, GwOrder};

    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl NotificationSink for Recorder {
        fn on_notification(&mut self, _gateway: &dyn Gateway, notification: Notification) {
            self.0.lock().push(format!("{:?}", notification));
        }
    }

    fn advised() -> (Arc<SimGateway>, Arc<Mutex<Vec<String>>>) {
        let _ = env_logger::try_init();
        let gateway = SimGateway::new(SimConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        gateway.advise(Box::new(Recorder(Arc::clone(&seen)))).unwrap();
        (gateway, seen)
    }

    #[test]
    fn test_startup_announces_connections() {
        let (gateway, seen) = advised();
        gateway.startup().unwrap();

        assert_eq!(gateway.pump(), 2);
        assert_eq!(
            *seen.lock(),
            vec![
                "data_connection_changed(Up)".to_string(),
                "gw_connection_changed(Down)".to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_symbol_is_incorrect() {
        let (gateway, seen) = advised();
        gateway.new_instrument("EP").unwrap();
        gateway.new_instrument("XYZ").unwrap();
        gateway.pump();

        assert_eq!(
            *seen.lock(),
            vec![
                "instrument_subscribed(EP)".to_string(),
                "incorrect_symbol(XYZ)".to_string(),
            ]
        );
        assert_eq!(gateway.instruments().unwrap().count(), Ok(1));
    }

    #[test]
    fn test_market_order_fills_at_trade_price() {
        let (gateway, _) = advised();
        let accounts = gateway.accounts().unwrap();
        let account = accounts.item(100_001).unwrap().unwrap();
        gateway.new_instrument("EP").unwrap();
        let instrument = gateway.instruments().unwrap().item("F.US.EPH5").unwrap().unwrap();

        let order = gateway
            .create_order(&NewOrder {
                order_type: GwOrderType::Market,
                instrument: &instrument,
                account: &account,
                quantity: 2,
                side: GwOrderSide::Buy,
                limit_price: 0.0,
                stop_price: 0.0,
                user_data: "",
            })
            .unwrap();
        order.place().unwrap();

        assert_eq!(order.filled_quantity(), Ok(2));
        assert_eq!(order.is_final(), Ok(true));
        assert_eq!(order.can_be_cancelled(), Ok(false));
    }

    #[test]
    fn test_unadvise_drops_notifications() {
        let (gateway, seen) = advised();
        gateway.unadvise().unwrap();
        gateway.data_error("late");

        assert_eq!(gateway.pump(), 0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_index_range_is_capped_by_history() {
        let request = RecordedBarsRequest {
            symbol: "EP".into(),
            range_start: Some(RangeBound::Index(0)),
            range_end: Some(RangeBound::Index(-500)),
            intraday_period: 1,
            sessions_filter: 31,
        };
        assert_eq!(request.wanted(OleDate::ZERO, 60), 60);
        assert_eq!(synthetic_bars(3, 1, Timestamp::default(), 10.0).len(), 3);
    }
}
