//! Order Lifecycle Tracker
//!
//! Submission, cancellation and working-order counts on the host side;
//! [`OrderTracker`] turns order-changed notifications into [`OrderInfo`]
//! snapshots on the callback side.
//!
//! The tracker relays state, it never infers it. It only enforces two bounds
//! on what it relays: `is_final` never reverts to false for a GUID, and
//! `filled_qty` stays within `[0, quantity]`.

use std::collections::HashSet;
use std::sync::Arc;

use cqg_core::{FillInfo, Id, OrderInfo, OrderPrice, OrderType, Price, PriceRoles, Quantity};
use cqg_ports::{
    ErrorRef, FillRef, Gateway, GwFill, GwOrder, GwOrderSide, GwOrderType, GwOrders, NewOrder,
    OrderRef,
};
use log::{info, warn};

use crate::accounts::{find_account, to_quantity};
use crate::collection::iterate;
use crate::error::{FacadeError, GwResultExt, Result};

/// Everything needed to place one order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTicket {
    pub order_type: OrderType,
    pub gw_account_id: Id,
    /// Canonical full name of a subscribed instrument
    pub symbol: String,
    pub buy: bool,
    pub quantity: Quantity,
    pub description: String,
    /// Limit price of a Limit order, trigger price of Stop and StopLimit
    pub price: OrderPrice,
    /// Limit price of a StopLimit order
    pub stop_limit_price: OrderPrice,
}

impl OrderTicket {
    fn new(
        order_type: OrderType,
        gw_account_id: Id,
        symbol: impl Into<String>,
        buy: bool,
        quantity: Quantity,
    ) -> Self {
        Self {
            order_type,
            gw_account_id,
            symbol: symbol.into(),
            buy,
            quantity,
            description: String::new(),
            price: OrderPrice::unset(),
            stop_limit_price: OrderPrice::unset(),
        }
    }

    pub fn market(gw_account_id: Id, symbol: impl Into<String>, buy: bool, quantity: Quantity) -> Self {
        Self::new(OrderType::Market, gw_account_id, symbol, buy, quantity)
    }

    pub fn limit(
        gw_account_id: Id,
        symbol: impl Into<String>,
        buy: bool,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            price: OrderPrice::new(price),
            ..Self::new(OrderType::Limit, gw_account_id, symbol, buy, quantity)
        }
    }

    pub fn stop(
        gw_account_id: Id,
        symbol: impl Into<String>,
        buy: bool,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            price: OrderPrice::new(price),
            ..Self::new(OrderType::Stop, gw_account_id, symbol, buy, quantity)
        }
    }

    /// `price` triggers the order, `stop_limit_price` is its limit
    pub fn stop_limit(
        gw_account_id: Id,
        symbol: impl Into<String>,
        buy: bool,
        quantity: Quantity,
        price: Price,
        stop_limit_price: Price,
    ) -> Self {
        Self {
            price: OrderPrice::new(price),
            stop_limit_price: OrderPrice::new(stop_limit_price),
            ..Self::new(OrderType::StopLimit, gw_account_id, symbol, buy, quantity)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn price_roles(&self) -> PriceRoles {
        self.order_type.price_roles(self.price, self.stop_limit_price)
    }
}

pub(crate) fn gateway_order_type(order_type: OrderType) -> GwOrderType {
    match order_type {
        OrderType::Market => GwOrderType::Market,
        OrderType::Limit => GwOrderType::Limit,
        OrderType::Stop => GwOrderType::Stop,
        OrderType::StopLimit => GwOrderType::StopLimit,
    }
}

/// Create, describe and place an order; returns its GUID
pub fn place_order(gateway: &dyn Gateway, ticket: &OrderTicket) -> Result<String> {
    let account = find_account(gateway, ticket.gw_account_id)?;

    let instruments = gateway.instruments().describe_with(gateway)?;
    let instrument = instruments
        .item(&ticket.symbol)
        .describe_with(&*instruments)?
        .ok_or_else(|| FacadeError::InstrumentNotFound(ticket.symbol.clone()))?;

    let roles = ticket.price_roles();
    let order = gateway
        .create_order(&NewOrder {
            order_type: gateway_order_type(ticket.order_type),
            instrument: &instrument,
            account: &account,
            quantity: ticket.quantity,
            side: if ticket.buy {
                GwOrderSide::Buy
            } else {
                GwOrderSide::Sell
            },
            limit_price: roles.limit.or_zero(),
            stop_price: roles.stop.or_zero(),
            user_data: "",
        })
        .describe_with(gateway)?;

    order
        .set_description(&ticket.description)
        .describe_with(&*order)?;
    order.place().describe_with(&*order)?;

    let guid = order.guid().describe_with(&*order)?;
    info!(
        "Placed {} {} {} x{} on account {} (guid {})",
        ticket.order_type,
        if ticket.buy { "buy" } else { "sell" },
        ticket.symbol,
        ticket.quantity,
        ticket.gw_account_id,
        guid
    );
    Ok(guid)
}

/// Submit a cancel for a live order; acceptance is not completion
pub fn cancel_order(gateway: &dyn Gateway, order_guid: &str) -> Result<()> {
    let orders = gateway.orders().describe_with(gateway)?;
    let order = orders
        .item_by_guid(order_guid)
        .describe_with(&*orders)?
        .ok_or(FacadeError::OrderNotFound)?;

    if !order.can_be_cancelled().unwrap_or(false) {
        return Err(FacadeError::OrderNotCancellable);
    }

    order.cancel().describe_with(&*order)?;
    info!("Cancel submitted for order {}", order_guid);
    Ok(())
}

/// Bulk cancel; absent filters select every account / every instrument
pub fn cancel_all_orders(
    gateway: &dyn Gateway,
    gw_account_id: Option<Id>,
    symbol: Option<&str>,
) -> Result<()> {
    let account = gw_account_id
        .map(|id| find_account(gateway, id))
        .transpose()?;

    let instrument = match symbol.filter(|s| !s.is_empty()) {
        Some(symbol) => {
            let instruments = gateway.instruments().describe_with(gateway)?;
            let instrument = instruments
                .item(symbol)
                .describe_with(&*instruments)?
                .ok_or_else(|| FacadeError::InstrumentNotFound(symbol.to_string()))?;
            Some(instrument)
        }
        None => None,
    };

    gateway
        .cancel_all_orders(account.as_ref(), instrument.as_ref())
        .describe_with(gateway)?;
    info!(
        "Cancel all submitted (account {:?}, symbol {:?})",
        gw_account_id, symbol
    );
    Ok(())
}

/// Which order collection a working-order count reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Every order visible to the connection
    All,
    /// Orders placed through this connection
    Internal,
}

pub fn order_collection(
    gateway: &dyn Gateway,
    gw_account_id: Option<Id>,
    scope: OrderScope,
) -> Result<Arc<dyn GwOrders>> {
    match gw_account_id {
        None => match scope {
            OrderScope::All => gateway.orders().describe_with(gateway),
            OrderScope::Internal => gateway.internal_orders().describe_with(gateway),
        },
        Some(id) => {
            let account = find_account(gateway, id)?;
            match scope {
                OrderScope::All => account.orders().describe_with(&*account),
                OrderScope::Internal => account.internal_orders().describe_with(&*account),
            }
        }
    }
}

/// Outcome of counting working orders
///
/// When the enumeration aborts, `count` holds what was counted so far.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingCount {
    pub count: usize,
    pub error: Option<FacadeError>,
}

/// Count the non-final orders of a collection
pub fn count_working(orders: &dyn GwOrders) -> WorkingCount {
    let mut count = 0;

    let iter = match iterate::<OrderRef, _>(Some(orders)) {
        Ok(iter) => iter,
        Err(code) => {
            return WorkingCount {
                count,
                error: Some(FacadeError::gateway(code, orders)),
            };
        }
    };

    for item in iter {
        let is_final = item
            .describe_with(orders)
            .and_then(|order| order.is_final().describe_with(&*order));

        match is_final {
            Ok(false) => count += 1,
            Ok(true) => {}
            Err(e) => {
                warn!("Working order count aborted after {} orders: {}", count, e);
                return WorkingCount {
                    count,
                    error: Some(e),
                };
            }
        }
    }

    WorkingCount { count, error: None }
}

/// Legs of one fill batch, all sharing the batch's canceled flag
pub fn fill_legs(fill: &dyn GwFill) -> Result<Vec<FillInfo>> {
    let canceled = fill.status().describe_with(fill)?.voids_legs();
    let leg_count = fill.leg_count().describe_with(fill)?;

    (0..leg_count)
        .map(|leg| {
            Ok(FillInfo {
                canceled,
                symbol: fill.instrument_name(leg).describe_with(fill)?,
                fill_price: fill.price(leg).describe_with(fill)?,
                fill_qty: fill.quantity(leg).describe_with(fill)?,
            })
        })
        .collect()
}

/// Callback-side state of the order lifecycle
#[derive(Debug, Default)]
pub struct OrderTracker {
    /// GUIDs already reported final
    finalized: HashSet<String>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finalized(&self, order_guid: &str) -> bool {
        self.finalized.contains(order_guid)
    }

    /// Drop what is kept for an order the gateway removed
    pub fn forget(&mut self, order_guid: &str) {
        self.finalized.remove(order_guid);
    }

    /// Snapshot for an order-changed notification
    ///
    /// Fill and error payloads are read only when the gateway reports them
    /// valid.
    pub fn order_changed(
        &mut self,
        order: &dyn GwOrder,
        fill: Option<&FillRef>,
        error: Option<&ErrorRef>,
    ) -> Result<OrderInfo> {
        let order_guid = order.guid().describe_with(order)?;
        let account = order.account().describe_with(order)?;

        let quantity = to_quantity(order.quantity().describe_with(order)?);
        let raw_filled = order.filled_quantity().describe_with(order)?;
        let filled_qty = raw_filled.clamp(0, i64::from(quantity));
        if filled_qty != raw_filled {
            warn!(
                "Order {} reported filled quantity {} outside [0, {}]",
                order_guid, raw_filled, quantity
            );
        }

        let mut is_final = order.is_final().describe_with(order)?;
        if is_final {
            self.finalized.insert(order_guid.clone());
        } else if self.finalized.contains(&order_guid) {
            warn!("Order {} reported working after final, kept final", order_guid);
            is_final = true;
        }

        let fills = match fill.filter(|f| f.is_valid()) {
            Some(fill) => fill_legs(&**fill)?,
            None => Vec::new(),
        };

        let error = match error.filter(|e| e.is_valid()) {
            Some(error) => error.description().describe_with(&**error)?,
            None => String::new(),
        };

        Ok(OrderInfo {
            gw_order_id: order.original_order_id().describe_with(order)?,
            symbol: order.instrument_name().describe_with(order)?,
            gw_account_id: account.gw_account_id().describe_with(&*account)?,
            buy: order.side().describe_with(order)? == GwOrderSide::Buy,
            is_final,
            quantity,
            filled_qty: filled_qty as Quantity,
            error,
            fills,
            description: order.description().describe_with(order)?,
            order_guid,
        })
    }
}
