//! Simulated gateway objects handed out through the ports traits

use std::sync::{Arc, Weak};

use cqg_core::{Id, MoneyAmount, Price, Volume};
use cqg_ports::{
    AccountRef, FillStatus, ForeignCollection, ForeignEnumerator, GwAccount, GwAccountSummary,
    GwAccounts, GwEnvironment, GwError, GwFill, GwInstrument, GwInstruments, GwObject, GwOrderSide,
    GwOrders, GwPosition, GwQuote, GwResult, GwTimedBar, GwTimedBars, GwTimedBarsRequest,
    InstrumentRef, OleDate, OrderRef, PositionRef, PositionsRef, QuoteRef, QuotesRef, RangeBound,
    RawQuoteType, RequestStatus, ResultCode, TimedBarRef,
};
use parking_lot::Mutex;

use crate::config::{SimAccountConfig, SimInstrumentConfig, SimPositionConfig};
use crate::faults::SimOp;
use crate::gateway::Shared;
use crate::order::SimOrder;

/// Objects that report the rich description of the last injected failure
macro_rules! rich_error_object {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl GwObject for $ty {
                fn supports_error_info(&self) -> bool {
                    true
                }

                fn error_description(&self) -> Option<String> {
                    self.shared.upgrade().and_then(|shared| shared.error_description())
                }
            }
        )+
    };
}

pub(crate) fn upgrade(shared: &Weak<Shared>) -> GwResult<Arc<Shared>> {
    shared.upgrade().ok_or(ResultCode::DISCONNECTED)
}

// ---------------------------------------------------------------------------
// Collections

pub(crate) struct SimCollection<T> {
    items: Vec<T>,
    fail_at: Option<(usize, ResultCode)>,
    shared: Weak<Shared>,
}

impl<T> SimCollection<T> {
    pub(crate) fn new(items: Vec<T>, shared: Weak<Shared>) -> Self {
        Self {
            items,
            fail_at: None,
            shared,
        }
    }

    pub(crate) fn failing_at(mut self, fail_at: Option<(usize, ResultCode)>) -> Self {
        self.fail_at = fail_at;
        self
    }

    pub(crate) fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: Send + Sync> GwObject for SimCollection<T> {
    fn supports_error_info(&self) -> bool {
        true
    }

    fn error_description(&self) -> Option<String> {
        self.shared.upgrade().and_then(|shared| shared.error_description())
    }
}

struct SimCursor<T> {
    items: Vec<T>,
    fail_at: Option<(usize, ResultCode)>,
    position: usize,
}

impl<T: Clone + Send> ForeignEnumerator<T> for SimCursor<T> {
    fn reset(&mut self) -> GwResult<()> {
        self.position = 0;
        Ok(())
    }

    fn next(&mut self) -> GwResult<Option<T>> {
        if let Some((index, code)) = self.fail_at {
            if index == self.position {
                return Err(code);
            }
        }
        let item = self.items.get(self.position).cloned();
        if item.is_some() {
            self.position += 1;
        }
        Ok(item)
    }
}

impl<T: Clone + Send + Sync + 'static> ForeignCollection<T> for SimCollection<T> {
    fn count(&self) -> GwResult<usize> {
        Ok(self.items.len())
    }

    fn new_enum(&self) -> GwResult<Box<dyn ForeignEnumerator<T>>> {
        Ok(Box::new(SimCursor {
            items: self.items.clone(),
            fail_at: self.fail_at,
            position: 0,
        }))
    }
}

pub(crate) struct SimAccounts {
    pub(crate) accounts: SimCollection<Arc<SimAccount>>,
}

impl GwObject for SimAccounts {}

impl ForeignCollection<AccountRef> for SimAccounts {
    fn count(&self) -> GwResult<usize> {
        self.accounts.count()
    }

    fn new_enum(&self) -> GwResult<Box<dyn ForeignEnumerator<AccountRef>>> {
        let items = self
            .accounts
            .items()
            .iter()
            .map(|account| Arc::clone(account) as AccountRef)
            .collect();
        Ok(Box::new(SimCursor {
            items,
            fail_at: None,
            position: 0,
        }))
    }
}

impl GwAccounts for SimAccounts {
    fn item(&self, gw_account_id: Id) -> GwResult<Option<AccountRef>> {
        Ok(self
            .accounts
            .items()
            .iter()
            .find(|account| account.gw_account_id == gw_account_id)
            .map(|account| Arc::clone(account) as AccountRef))
    }
}

pub(crate) struct SimInstruments {
    pub(crate) instruments: Vec<Arc<SimInstrument>>,
}

impl GwObject for SimInstruments {}

impl ForeignCollection<InstrumentRef> for SimInstruments {
    fn count(&self) -> GwResult<usize> {
        Ok(self.instruments.len())
    }

    fn new_enum(&self) -> GwResult<Box<dyn ForeignEnumerator<InstrumentRef>>> {
        let items = self
            .instruments
            .iter()
            .map(|instrument| Arc::clone(instrument) as InstrumentRef)
            .collect();
        Ok(Box::new(SimCursor {
            items,
            fail_at: None,
            position: 0,
        }))
    }
}

impl GwInstruments for SimInstruments {
    fn item(&self, full_name: &str) -> GwResult<Option<InstrumentRef>> {
        Ok(self
            .instruments
            .iter()
            .find(|instrument| instrument.full_name == full_name)
            .map(|instrument| Arc::clone(instrument) as InstrumentRef))
    }
}

pub(crate) struct SimOrders {
    pub(crate) orders: SimCollection<Arc<SimOrder>>,
}

impl GwObject for SimOrders {
    fn supports_error_info(&self) -> bool {
        self.orders.supports_error_info()
    }

    fn error_description(&self) -> Option<String> {
        self.orders.error_description()
    }
}

impl ForeignCollection<OrderRef> for SimOrders {
    fn count(&self) -> GwResult<usize> {
        self.orders.count()
    }

    fn new_enum(&self) -> GwResult<Box<dyn ForeignEnumerator<OrderRef>>> {
        let items = self
            .orders
            .items()
            .iter()
            .map(|order| Arc::clone(order) as OrderRef)
            .collect();
        Ok(Box::new(SimCursor {
            items,
            fail_at: self.orders.fail_at,
            position: 0,
        }))
    }
}

impl GwOrders for SimOrders {
    fn item_by_guid(&self, guid: &str) -> GwResult<Option<OrderRef>> {
        Ok(self
            .orders
            .items()
            .iter()
            .find(|order| order.guid == guid)
            .map(|order| Arc::clone(order) as OrderRef))
    }
}

// ---------------------------------------------------------------------------
// Instruments and quotes

pub(crate) struct SimQuote {
    pub(crate) raw: RawQuoteType,
    pub(crate) price: Price,
    pub(crate) volume: Volume,
    pub(crate) valid: bool,
}

impl SimQuote {
    pub(crate) fn new(raw: RawQuoteType, price: Price, volume: Volume) -> Arc<Self> {
        Arc::new(Self {
            raw,
            price,
            volume,
            valid: true,
        })
    }
}

impl GwObject for SimQuote {
    fn is_valid(&self) -> bool {
        self.valid
    }
}

impl GwQuote for SimQuote {
    fn quote_type(&self) -> GwResult<RawQuoteType> {
        Ok(self.raw)
    }

    fn price(&self) -> GwResult<Price> {
        Ok(self.price)
    }

    fn volume(&self) -> GwResult<Volume> {
        Ok(self.volume)
    }
}

pub(crate) struct SimInstrument {
    /// Name hosts request it by
    pub(crate) symbol: String,
    pub(crate) full_name: String,
    quotes: Mutex<Vec<Arc<SimQuote>>>,
}

impl SimInstrument {
    pub(crate) fn from_config(config: &SimInstrumentConfig) -> Self {
        let mut quotes = vec![
            SimQuote::new(RawQuoteType::Ask, config.ask, config.volume),
            SimQuote::new(RawQuoteType::Bid, config.bid, config.volume),
            SimQuote::new(RawQuoteType::Trade, config.trade, config.volume),
            SimQuote::new(RawQuoteType::DayOpen, config.trade, 0),
        ];
        if let Some(settlement) = config.yesterday_settlement {
            quotes.push(SimQuote::new(RawQuoteType::YesterdaySettlement, settlement, 0));
        }

        Self {
            symbol: config.symbol.clone(),
            full_name: config.full_name.clone(),
            quotes: Mutex::new(quotes),
        }
    }

    pub(crate) fn matches(&self, symbol: &str) -> bool {
        self.symbol == symbol || self.full_name == symbol
    }

    pub(crate) fn trade_price(&self) -> Option<Price> {
        self.quotes
            .lock()
            .iter()
            .find(|quote| quote.raw == RawQuoteType::Trade && quote.valid)
            .map(|quote| quote.price)
    }

    /// Replace quotes of the given types, keeping the others
    pub(crate) fn update_quotes(&self, changed: &[Arc<SimQuote>]) {
        let mut quotes = self.quotes.lock();
        for quote in changed {
            match quotes.iter_mut().find(|q| q.raw == quote.raw) {
                Some(slot) => *slot = Arc::clone(quote),
                None => quotes.push(Arc::clone(quote)),
            }
        }
    }
}

impl GwObject for SimInstrument {}

impl GwInstrument for SimInstrument {
    fn full_name(&self) -> GwResult<String> {
        Ok(self.full_name.clone())
    }

    fn quotes(&self) -> GwResult<QuotesRef> {
        let items = self
            .quotes
            .lock()
            .iter()
            .map(|quote| Arc::clone(quote) as QuoteRef)
            .collect();
        Ok(Arc::new(SimCollection::new(items, Weak::new())))
    }
}

// ---------------------------------------------------------------------------
// Accounts and positions

pub(crate) struct SimAccountSummary {
    balance: MoneyAmount,
    ote: MoneyAmount,
    profit_loss: MoneyAmount,
}

impl SimAccountSummary {
    fn amount(&self, currency_index: usize, amount: MoneyAmount) -> GwResult<MoneyAmount> {
        if currency_index == 0 {
            Ok(amount)
        } else {
            Err(ResultCode::INVALID_ARG)
        }
    }
}

impl GwObject for SimAccountSummary {}

impl GwAccountSummary for SimAccountSummary {
    fn balance(&self, currency_index: usize) -> GwResult<f64> {
        self.amount(currency_index, self.balance)
    }

    fn ote(&self, currency_index: usize) -> GwResult<f64> {
        self.amount(currency_index, self.ote)
    }

    fn profit_loss(&self, currency_index: usize) -> GwResult<f64> {
        self.amount(currency_index, self.profit_loss)
    }
}

pub(crate) struct SimPosition {
    config: SimPositionConfig,
}

impl SimPosition {
    pub(crate) fn new(config: SimPositionConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}

impl GwObject for SimPosition {}

impl GwPosition for SimPosition {
    fn instrument_name(&self) -> GwResult<String> {
        Ok(self.config.symbol.clone())
    }

    fn side(&self) -> GwResult<GwOrderSide> {
        Ok(if self.config.long {
            GwOrderSide::Buy
        } else {
            GwOrderSide::Sell
        })
    }

    fn quantity(&self) -> GwResult<i64> {
        Ok(self.config.quantity)
    }

    fn average_price(&self) -> GwResult<Price> {
        self.config.average_price.ok_or(ResultCode::FAIL)
    }

    fn ote(&self) -> GwResult<f64> {
        Ok(self.config.ote)
    }

    fn profit_loss(&self) -> GwResult<f64> {
        Ok(self.config.profit_loss)
    }
}

#[derive(Debug, Clone, Copy)]
struct Money {
    balance: MoneyAmount,
    ote: MoneyAmount,
    profit_loss: MoneyAmount,
}

pub(crate) struct SimAccount {
    pub(crate) gw_account_id: Id,
    fcm_id: Id,
    fcm_account_id: String,
    name: String,
    currency: String,
    money: Mutex<Money>,
    positions: Mutex<Vec<Arc<SimPosition>>>,
    shared: Weak<Shared>,
}

impl SimAccount {
    pub(crate) fn from_config(config: &SimAccountConfig, shared: Weak<Shared>) -> Self {
        Self {
            gw_account_id: config.gw_account_id,
            fcm_id: config.fcm_id,
            fcm_account_id: config.fcm_account_id.clone(),
            name: config.name.clone(),
            currency: config.currency.clone(),
            money: Mutex::new(Money {
                balance: config.balance,
                ote: config.ote,
                profit_loss: config.profit_loss,
            }),
            positions: Mutex::new(
                config
                    .positions
                    .iter()
                    .cloned()
                    .map(SimPosition::new)
                    .collect(),
            ),
            shared,
        }
    }

    pub(crate) fn set_money(&self, balance: MoneyAmount, ote: MoneyAmount, profit_loss: MoneyAmount) {
        *self.money.lock() = Money {
            balance,
            ote,
            profit_loss,
        };
    }

    /// Insert or replace the position for the symbol; true when added
    pub(crate) fn upsert_position(&self, position: Arc<SimPosition>) -> bool {
        let mut positions = self.positions.lock();
        match positions
            .iter_mut()
            .find(|p| p.config.symbol == position.config.symbol)
        {
            Some(slot) => {
                *slot = position;
                false
            }
            None => {
                positions.push(position);
                true
            }
        }
    }
}

rich_error_object!(SimAccount);

impl GwAccount for SimAccount {
    fn fcm_id(&self) -> GwResult<Id> {
        Ok(self.fcm_id)
    }

    fn fcm_account_id(&self) -> GwResult<String> {
        Ok(self.fcm_account_id.clone())
    }

    fn gw_account_id(&self) -> GwResult<Id> {
        Ok(self.gw_account_id)
    }

    fn gw_account_name(&self) -> GwResult<String> {
        Ok(self.name.clone())
    }

    fn reporting_currency(&self) -> GwResult<String> {
        Ok(self.currency.clone())
    }

    fn summary(&self) -> GwResult<Arc<dyn GwAccountSummary>> {
        upgrade(&self.shared)?.check(SimOp::AccountSummary)?;
        let money = *self.money.lock();
        Ok(Arc::new(SimAccountSummary {
            balance: money.balance,
            ote: money.ote,
            profit_loss: money.profit_loss,
        }))
    }

    fn positions(&self) -> GwResult<PositionsRef> {
        upgrade(&self.shared)?.check(SimOp::Positions)?;
        let items = self
            .positions
            .lock()
            .iter()
            .map(|position| Arc::clone(position) as PositionRef)
            .collect();
        Ok(Arc::new(SimCollection::new(items, self.shared.clone())))
    }

    fn orders(&self) -> GwResult<Arc<dyn GwOrders>> {
        upgrade(&self.shared)?.order_collection(Some(self.gw_account_id), false)
    }

    fn internal_orders(&self) -> GwResult<Arc<dyn GwOrders>> {
        upgrade(&self.shared)?.order_collection(Some(self.gw_account_id), true)
    }
}

// ---------------------------------------------------------------------------
// Fills and errors

/// One leg of a simulated fill
#[derive(Debug, Clone, PartialEq)]
pub struct SimFillLeg {
    pub symbol: String,
    pub price: Price,
    pub quantity: Volume,
}

impl SimFillLeg {
    pub fn new(symbol: impl Into<String>, price: Price, quantity: Volume) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            quantity,
        }
    }
}

pub(crate) struct SimFill {
    pub(crate) status: FillStatus,
    pub(crate) legs: Vec<SimFillLeg>,
}

impl SimFill {
    fn leg(&self, leg: usize) -> GwResult<&SimFillLeg> {
        self.legs.get(leg).ok_or(ResultCode::INVALID_ARG)
    }
}

impl GwObject for SimFill {}

impl GwFill for SimFill {
    fn status(&self) -> GwResult<FillStatus> {
        Ok(self.status)
    }

    fn leg_count(&self) -> GwResult<usize> {
        Ok(self.legs.len())
    }

    fn instrument_name(&self, leg: usize) -> GwResult<String> {
        Ok(self.leg(leg)?.symbol.clone())
    }

    fn price(&self, leg: usize) -> GwResult<Price> {
        Ok(self.leg(leg)?.price)
    }

    fn quantity(&self, leg: usize) -> GwResult<Volume> {
        Ok(self.leg(leg)?.quantity)
    }
}

pub(crate) struct SimError {
    pub(crate) description: String,
}

impl GwObject for SimError {}

impl GwError for SimError {
    fn description(&self) -> GwResult<String> {
        Ok(self.description.clone())
    }
}

// ---------------------------------------------------------------------------
// Timed bars

#[derive(Default)]
pub(crate) struct SimTimedBarsRequest {
    symbol: String,
    range_start: Option<RangeBound>,
    range_end: Option<RangeBound>,
    intraday_period: i32,
    sessions_filter: i32,
}

impl GwObject for SimTimedBarsRequest {}

impl GwTimedBarsRequest for SimTimedBarsRequest {
    fn set_symbol(&mut self, symbol: &str) -> GwResult<()> {
        if symbol.is_empty() {
            return Err(ResultCode::INVALID_ARG);
        }
        self.symbol = symbol.to_string();
        Ok(())
    }

    fn set_range_start(&mut self, bound: RangeBound) -> GwResult<()> {
        self.range_start = Some(bound);
        Ok(())
    }

    fn set_range_end(&mut self, bound: RangeBound) -> GwResult<()> {
        self.range_end = Some(bound);
        Ok(())
    }

    fn set_intraday_period(&mut self, minutes: i32) -> GwResult<()> {
        if minutes < 0 {
            return Err(ResultCode::INVALID_ARG);
        }
        self.intraday_period = minutes;
        Ok(())
    }

    fn set_sessions_filter(&mut self, filter: i32) -> GwResult<()> {
        self.sessions_filter = filter;
        Ok(())
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn range_start(&self) -> Option<RangeBound> {
        self.range_start
    }

    fn range_end(&self) -> Option<RangeBound> {
        self.range_end
    }

    fn intraday_period(&self) -> i32 {
        self.intraday_period
    }

    fn sessions_filter(&self) -> i32 {
        self.sessions_filter
    }
}

pub(crate) struct SimTimedBar {
    pub(crate) timestamp: OleDate,
    pub(crate) open: Price,
    pub(crate) high: Price,
    pub(crate) low: Price,
    pub(crate) close: Price,
}

impl GwObject for SimTimedBar {}

impl GwTimedBar for SimTimedBar {
    fn timestamp(&self) -> GwResult<OleDate> {
        Ok(self.timestamp)
    }

    fn open(&self) -> GwResult<Price> {
        Ok(self.open)
    }

    fn high(&self) -> GwResult<Price> {
        Ok(self.high)
    }

    fn low(&self) -> GwResult<Price> {
        Ok(self.low)
    }

    fn close(&self) -> GwResult<Price> {
        Ok(self.close)
    }
}

pub(crate) struct SimTimedBars {
    pub(crate) id: String,
    pub(crate) symbol: String,
    status: Mutex<RequestStatus>,
    bars: Mutex<Vec<Arc<SimTimedBar>>>,
}

impl SimTimedBars {
    pub(crate) fn new(id: String, symbol: String) -> Self {
        Self {
            id,
            symbol,
            status: Mutex::new(RequestStatus::InProgress),
            bars: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn complete(&self, status: RequestStatus, bars: Vec<Arc<SimTimedBar>>) {
        *self.status.lock() = status;
        *self.bars.lock() = bars;
    }
}

impl GwObject for SimTimedBars {}

impl GwTimedBars for SimTimedBars {
    fn id(&self) -> GwResult<String> {
        Ok(self.id.clone())
    }

    fn status(&self) -> GwResult<RequestStatus> {
        Ok(*self.status.lock())
    }

    fn count(&self) -> GwResult<usize> {
        Ok(self.bars.lock().len())
    }

    fn item(&self, index: usize) -> GwResult<TimedBarRef> {
        self.bars
            .lock()
            .get(index)
            .map(|bar| Arc::clone(bar) as TimedBarRef)
            .ok_or(ResultCode::INVALID_ARG)
    }
}

// ---------------------------------------------------------------------------
// Environment

pub(crate) struct SimEnvironment {
    pub(crate) shared: Weak<Shared>,
}

rich_error_object!(SimEnvironment);

impl GwEnvironment for SimEnvironment {
    fn line_time(&self) -> GwResult<OleDate> {
        Ok(upgrade(&self.shared)?.state.lock().line_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_fails_at_index() {
        let collection = SimCollection::new(vec![1, 2, 3], Weak::new())
            .failing_at(Some((2, ResultCode::FAIL)));
        let mut cursor = collection.new_enum().unwrap();

        assert_eq!(cursor.next(), Ok(Some(1)));
        assert_eq!(cursor.next(), Ok(Some(2)));
        assert_eq!(cursor.next(), Err(ResultCode::FAIL));
    }

    #[test]
    fn test_instrument_quote_update_replaces_by_type() {
        let instrument = SimInstrument::from_config(&SimInstrumentConfig::new(
            "EP",
            "F.US.EPH5",
            2050.50,
        ));
        assert_eq!(instrument.trade_price(), Some(2050.50));

        instrument.update_quotes(&[SimQuote::new(RawQuoteType::Trade, 2051.0, 2)]);
        assert_eq!(instrument.trade_price(), Some(2051.0));
        assert!(instrument.matches("EP"));
        assert!(instrument.matches("F.US.EPH5"));
    }

    #[test]
    fn test_summary_only_reporting_currency() {
        let summary = SimAccountSummary {
            balance: 10.0,
            ote: 1.0,
            profit_loss: 2.0,
        };
        assert_eq!(summary.balance(0), Ok(10.0));
        assert_eq!(summary.balance(1), Err(ResultCode::INVALID_ARG));
    }
}
