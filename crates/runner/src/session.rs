//! Demo session
//!
//! Reacts to facade events the way a small trading host would: log on when
//! the trading channel comes up disconnected, list accounts and positions,
//! resolve the trade symbol, place one order of each kind on it, cancel the
//! stop-limit, then report working orders and cancel everything. Bars are
//! loaded for every configured symbol once market data is up; a short
//! series is re-requested once with twice the count.

use std::collections::{BTreeMap, HashMap, HashSet};

use cqg_core::{Bars, BarsRequest, Id, OrderInfo, QuoteType, SymbolInfo};
use cqg_facade::{Facade, FacadeEvent, OrderTicket};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::RunnerConfig;

/// Whether the session wants more events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done,
}

/// What the session did, printed when the run ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub accounts: Vec<Id>,
    pub positions: usize,
    /// Requested symbol -> full name
    pub symbols: BTreeMap<String, String>,
    pub placed_orders: Vec<String>,
    pub final_orders: usize,
    pub fills: usize,
    /// Bars received per symbol
    pub bars: BTreeMap<String, usize>,
    pub working_orders: Option<usize>,
    pub internal_working_orders: Option<usize>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
struct BarsInFlight {
    symbol: String,
    count: i32,
    retried: bool,
}

pub struct DemoSession {
    user: String,
    password: String,
    trade_symbol: String,
    bar_symbols: Vec<String>,
    bar_count: i32,
    bar_period_minutes: i32,

    logon_sent: bool,
    account: Option<Id>,
    orders_placed: bool,
    stop_limit: Option<String>,
    cancel_sent: bool,
    orders_done: bool,
    finals: HashSet<String>,
    bars_requested: bool,
    bars_in_flight: HashMap<String, BarsInFlight>,
    report: SessionReport,
}

impl DemoSession {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            user: config.user.clone(),
            password: config.password.clone(),
            trade_symbol: config.trade_symbol.clone(),
            bar_symbols: config.bar_symbols.clone(),
            bar_count: config.bar_count,
            bar_period_minutes: config.bar_period_minutes,
            logon_sent: false,
            account: None,
            orders_placed: false,
            stop_limit: None,
            cancel_sent: false,
            orders_done: false,
            finals: HashSet::new(),
            bars_requested: false,
            bars_in_flight: HashMap::new(),
            report: SessionReport::default(),
        }
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn into_report(self) -> SessionReport {
        self.report
    }

    pub fn is_done(&self) -> bool {
        self.orders_done && self.bars_requested && self.bars_in_flight.is_empty()
    }

    pub fn handle(&mut self, facade: &mut Facade, event: FacadeEvent) -> Flow {
        match event {
            FacadeEvent::Error(message) => {
                warn!("Gateway error: {}", message);
                self.report.errors.push(message);
            }
            FacadeEvent::MarketDataConnection(connected) => {
                info!("Market data {}", if connected { "connected" } else { "disconnected" });
                if connected && !self.bars_requested {
                    self.request_all_bars(facade);
                }
            }
            FacadeEvent::TradingConnection(connected) => {
                info!("Trading {}", if connected { "connected" } else { "disconnected" });
                if !connected && !self.logon_sent {
                    self.logon_sent = true;
                    info!("Logging on as {}", self.user);
                    let result = facade.logon_to_gateway(&self.user, &self.password);
                    self.note(result);
                }
            }
            FacadeEvent::AccountsReloaded => self.list_accounts(facade),
            FacadeEvent::PositionsReloaded => self.list_positions(facade),
            FacadeEvent::SymbolSubscribed { requested, symbol } => {
                self.symbol_subscribed(facade, requested, symbol)
            }
            FacadeEvent::SymbolError(symbol) => {
                warn!("Symbol {} could not be resolved", symbol);
                if symbol == self.trade_symbol {
                    self.orders_done = true;
                }
            }
            FacadeEvent::SymbolQuote(symbol) => {
                debug!("Quotes for {}: {:?}", symbol.full_name, symbol.last_quotes);
            }
            FacadeEvent::AccountChanged(account) => {
                info!(
                    "Account {} balance {:.2} OTE {:.2}",
                    account.gw_account_id, account.balance, account.ote
                );
            }
            FacadeEvent::PositionChanged {
                account,
                position,
                is_new,
            } => {
                info!(
                    "{} position on {}: {} {} x{}",
                    if is_new { "New" } else { "Changed" },
                    account.gw_account_id,
                    position.symbol,
                    if position.long_position { "long" } else { "short" },
                    position.quantity
                );
            }
            FacadeEvent::OrderChanged(order) => self.order_changed(facade, order),
            FacadeEvent::BarsReceived(bars) => self.bars_received(facade, bars),
        }

        if self.is_done() {
            Flow::Done
        } else {
            Flow::Continue
        }
    }

    fn note<T>(&mut self, result: cqg_facade::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{}", e);
                self.report.errors.push(e.to_string());
                None
            }
        }
    }

    fn list_accounts(&mut self, facade: &mut Facade) {
        let Some(accounts) = self.note(facade.accounts()) else {
            return;
        };
        for account in &accounts {
            info!(
                "Account {} '{}' ({} {}): balance {:.2} {}",
                account.gw_account_id,
                account.gw_account_name,
                account.fcm_id,
                account.fcm_account_id,
                account.balance,
                account.currency
            );
        }
        self.report.accounts = accounts.iter().map(|a| a.gw_account_id).collect();
        self.account = accounts.first().map(|a| a.gw_account_id);

        if !self.orders_placed {
            info!("Requesting {}", self.trade_symbol);
            let result = facade.request_symbol(&self.trade_symbol);
            if self.note(result).is_none() {
                self.orders_done = true;
            }
        }
    }

    fn list_positions(&mut self, facade: &mut Facade) {
        for gw_account_id in self.report.accounts.clone() {
            let Some(positions) = self.note(facade.positions(gw_account_id)) else {
                continue;
            };
            for position in &positions {
                info!(
                    "Position {} {} x{} @ {}",
                    position.symbol,
                    if position.long_position { "long" } else { "short" },
                    position.quantity,
                    position.average_price
                );
            }
            self.report.positions += positions.len();
        }
    }

    fn symbol_subscribed(&mut self, facade: &mut Facade, requested: String, symbol: SymbolInfo) {
        info!("{} resolved to {}", requested, symbol.full_name);
        for quote in &symbol.last_quotes {
            info!(
                "  {} {} x{}",
                quote.quote_type.as_str(),
                quote.price,
                quote.volume
            );
        }
        self.report
            .symbols
            .insert(requested.clone(), symbol.full_name.clone());

        if requested == self.trade_symbol && !self.orders_placed {
            self.place_orders(facade, &symbol);
        }
    }

    fn place_orders(&mut self, facade: &mut Facade, symbol: &SymbolInfo) {
        self.orders_placed = true;
        let Some(account) = self.account else {
            warn!("No account to trade {} on", symbol.full_name);
            self.orders_done = true;
            return;
        };
        let Some(trade) = symbol.quote(QuoteType::Trade).map(|q| q.price) else {
            warn!("No trade price for {}", symbol.full_name);
            self.orders_done = true;
            return;
        };

        let name = symbol.full_name.as_str();
        let tickets = [
            OrderTicket::market(account, name, true, 1).with_description("demo market"),
            OrderTicket::limit(account, name, true, 1, trade - 0.10).with_description("demo limit"),
        ];
        for ticket in &tickets {
            if let Some(guid) = self.note(facade.place_order(ticket)) {
                self.report.placed_orders.push(guid);
            }
        }

        let stop_limit = OrderTicket::stop_limit(account, name, false, 1, trade - 0.02, trade - 0.06)
            .with_description("demo stop limit");
        if let Some(guid) = self.note(facade.place_order(&stop_limit)) {
            self.report.placed_orders.push(guid.clone());
            self.stop_limit = Some(guid);
        } else {
            self.finish_orders(facade);
        }
    }

    fn order_changed(&mut self, facade: &mut Facade, order: OrderInfo) {
        info!(
            "Order {} [{}] {} {} x{} filled {} final={} {}",
            order.order_guid,
            order.gw_order_id,
            if order.buy { "buy" } else { "sell" },
            order.symbol,
            order.quantity,
            order.filled_qty,
            order.is_final,
            order.error
        );
        for fill in &order.fills {
            info!(
                "  fill {} x{} @ {}{}",
                fill.symbol,
                fill.fill_qty,
                fill.fill_price,
                if fill.canceled { " (canceled)" } else { "" }
            );
        }
        self.report.fills += order.fills.len();
        if order.is_final && self.finals.insert(order.order_guid.clone()) {
            self.report.final_orders += 1;
        }
        self.working_counts(facade);

        if self.stop_limit.as_deref() != Some(order.order_guid.as_str()) || self.orders_done {
            return;
        }
        if !order.is_final && !self.cancel_sent {
            self.cancel_sent = true;
            info!("Cancelling stop-limit {}", order.order_guid);
            let result = facade.cancel_order(&order.order_guid);
            if self.note(result).is_none() {
                self.finish_orders(facade);
            }
        } else if order.is_final {
            self.finish_orders(facade);
        }
    }

    fn working_counts(&self, facade: &mut Facade) -> (usize, usize) {
        let all = facade.all_working_orders_count(self.account);
        let internal = facade.internal_working_orders_count(self.account);
        info!("Working orders: {} ({} placed here)", all, internal);
        (all, internal)
    }

    /// Cancel whatever is still working when the run ends early
    pub fn wind_down(&mut self, facade: &mut Facade) {
        if !self.orders_done && facade.is_valid() {
            self.finish_orders(facade);
        }
    }

    fn finish_orders(&mut self, facade: &mut Facade) {
        let (all, internal) = self.working_counts(facade);
        self.report.working_orders = Some(all);
        self.report.internal_working_orders = Some(internal);

        let result = facade.cancel_all_orders(None, None);
        self.note(result);
        self.orders_done = true;
    }

    fn request_all_bars(&mut self, facade: &mut Facade) {
        self.bars_requested = true;
        for symbol in self.bar_symbols.clone() {
            self.request_bars(facade, symbol, self.bar_count, false);
        }
    }

    fn request_bars(&mut self, facade: &mut Facade, symbol: String, count: i32, retried: bool) {
        let request = BarsRequest::last_bars(symbol.clone(), count, self.bar_period_minutes);
        if let Some(id) = self.note(facade.request_bars(&request)) {
            self.bars_in_flight.insert(
                id,
                BarsInFlight {
                    symbol,
                    count,
                    retried,
                },
            );
        }
    }

    fn bars_received(&mut self, facade: &mut Facade, bars: Bars) {
        let Some(request) = self.bars_in_flight.remove(&bars.request_guid) else {
            debug!("Ignoring bars {}", bars.request_guid);
            return;
        };

        if !bars.is_ok() {
            warn!("Bars for {} failed: {}", request.symbol, bars.error);
            self.report.errors.push(bars.error);
            return;
        }

        info!("{} bars for {}", bars.bars.len(), request.symbol);
        if let Some(last) = bars.bars.last() {
            info!(
                "  last {} O {} H {} L {} C {}",
                last.timestamp, last.open, last.high, last.low, last.close
            );
        }

        let wanted = bars.requested_count.unsigned_abs() as usize;
        if bars.bars.len() < wanted && !request.retried {
            info!("Short series for {}, asking for {}", request.symbol, request.count * 2);
            self.request_bars(facade, request.symbol, request.count * 2, true);
            return;
        }
        self.report.bars.insert(request.symbol, bars.bars.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, mpsc};

    use cqg_facade::EventForwarder;
    use cqg_gateway_sim::{SimConfig, SimGateway};
    use cqg_ports::RangeBound;

    /// Pump and dispatch synchronously until the session is done
    fn drive(config: &RunnerConfig) -> (DemoSession, Arc<SimGateway>, bool) {
        let sim = SimGateway::new(config.sim.clone());
        let mut facade = Facade::with_config(sim.factory(), config.connector.clone());
        let (tx, rx) = mpsc::channel();
        facade
            .initialize(Arc::new(EventForwarder::new(move |event| {
                let _ = tx.send(event);
            })))
            .unwrap();

        let mut session = DemoSession::new(config);
        for _ in 0..50 {
            sim.pump();
            for event in rx.try_iter() {
                if session.handle(&mut facade, event) == Flow::Done {
                    return (session, sim, true);
                }
            }
        }
        (session, sim, false)
    }

    #[test]
    fn test_demo_flow_completes() {
        let (session, sim, done) = drive(&RunnerConfig::default());
        assert!(done);

        let report = session.report();
        assert_eq!(report.accounts, vec![100_001]);
        assert_eq!(report.symbols.get("CLE").map(String::as_str), Some("F.US.CLEJ5"));
        assert_eq!(report.placed_orders.len(), 3);
        // Market order filled, stop-limit cancelled, limit still working
        assert_eq!(report.working_orders, Some(1));
        assert_eq!(report.internal_working_orders, Some(1));
        assert!(report.fills >= 1);
        assert_eq!(report.bars.get("EP"), Some(&10));
        assert_eq!(report.bars.get("CLE"), Some(&10));
        assert!(report.errors.is_empty());

        assert!(sim.logon_credentials().is_some());
        assert!(sim.last_cancel_all().is_some());
    }

    #[test]
    fn test_short_series_is_retried_once() {
        let mut config = RunnerConfig::default();
        config.sim.bar_history = 4;
        config.bar_symbols = vec!["EP".to_string()];

        let (session, sim, done) = drive(&config);
        assert!(done);
        assert_eq!(session.report().bars.get("EP"), Some(&4));
        assert_eq!(
            sim.last_bars_request().and_then(|r| r.range_end),
            Some(RangeBound::Index(-20))
        );
    }

    #[test]
    fn test_unknown_trade_symbol_places_nothing() {
        let config = RunnerConfig {
            trade_symbol: "NOPE".to_string(),
            sim: SimConfig::default(),
            ..RunnerConfig::default()
        };

        let (session, sim, done) = drive(&config);
        assert!(done);
        assert!(session.report().placed_orders.is_empty());
        assert!(sim.created_orders().is_empty());
    }
}
