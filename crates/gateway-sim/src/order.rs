use std::sync::{Arc, Weak};

use cqg_core::{Id, Price};
use cqg_ports::{
    AccountRef, GwObject, GwOrder, GwOrderSide, GwOrderType, GwResult, OrderChangeType, OrderRef,
    ResultCode,
};
use parking_lot::Mutex;

use crate::faults::SimOp;
use crate::gateway::Shared;
use crate::objects::upgrade;

/// Order as it was handed to the simulator
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub guid: String,
    pub gw_order_id: String,
    pub order_type: GwOrderType,
    pub symbol: String,
    pub gw_account_id: Id,
    pub side: GwOrderSide,
    pub quantity: i64,
    pub limit_price: Price,
    pub stop_price: Price,
    pub description: String,
    pub placed: bool,
    pub is_final: bool,
    pub filled: i64,
    pub internal: bool,
}

#[derive(Debug, Default)]
struct OrderState {
    description: String,
    placed: bool,
    is_final: bool,
    filled: i64,
}

/// Immutable order attributes fixed at creation
pub(crate) struct OrderSpec {
    pub(crate) gw_order_id: String,
    pub(crate) order_type: GwOrderType,
    pub(crate) symbol: String,
    pub(crate) account: AccountRef,
    pub(crate) gw_account_id: Id,
    pub(crate) side: GwOrderSide,
    pub(crate) quantity: i64,
    pub(crate) limit_price: Price,
    pub(crate) stop_price: Price,
    pub(crate) internal: bool,
}

pub(crate) struct SimOrder {
    me: Weak<SimOrder>,
    shared: Weak<Shared>,
    pub(crate) guid: String,
    spec: OrderSpec,
    state: Mutex<OrderState>,
}

impl SimOrder {
    pub(crate) fn new(spec: OrderSpec, shared: Weak<Shared>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            shared,
            guid: uuid::Uuid::new_v4().to_string(),
            spec,
            state: Mutex::new(OrderState::default()),
        })
    }

    /// Shared handle to this order for notifications
    pub(crate) fn order_ref(&self) -> GwResult<OrderRef> {
        self.me
            .upgrade()
            .map(|order| order as OrderRef)
            .ok_or(ResultCode::UNEXPECTED)
    }

    pub(crate) fn symbol(&self) -> &str {
        &self.spec.symbol
    }

    pub(crate) fn gw_account_id(&self) -> Id {
        self.spec.gw_account_id
    }

    pub(crate) fn is_internal(&self) -> bool {
        self.spec.internal
    }

    pub(crate) fn is_market(&self) -> bool {
        self.spec.order_type == GwOrderType::Market
    }

    pub(crate) fn is_placed(&self) -> bool {
        self.state.lock().placed
    }

    pub(crate) fn is_working(&self) -> bool {
        let state = self.state.lock();
        state.placed && !state.is_final
    }

    pub(crate) fn remaining(&self) -> i64 {
        (self.spec.quantity - self.state.lock().filled).max(0)
    }

    /// Mark the order as accepted without going through [`GwOrder::place`]
    pub(crate) fn mark_placed(&self) {
        self.state.lock().placed = true;
    }

    /// Stop working; false when the order already was final
    pub(crate) fn finish(&self) -> bool {
        let mut state = self.state.lock();
        let was_final = state.is_final;
        state.is_final = true;
        !was_final
    }

    /// Apply a signed fill quantity; the order turns final once fully filled
    pub(crate) fn apply_fill(&self, quantity: i64) {
        let mut state = self.state.lock();
        state.filled = (state.filled + quantity).clamp(0, self.spec.quantity);
        if state.filled >= self.spec.quantity {
            state.is_final = true;
        }
    }

    /// Overwrite the reported status, including inconsistent values
    pub(crate) fn force(&self, is_final: bool, filled: i64) {
        let mut state = self.state.lock();
        state.is_final = is_final;
        state.filled = filled;
    }

    pub(crate) fn snapshot(&self) -> CreatedOrder {
        let state = self.state.lock();
        CreatedOrder {
            guid: self.guid.clone(),
            gw_order_id: self.spec.gw_order_id.clone(),
            order_type: self.spec.order_type,
            symbol: self.spec.symbol.clone(),
            gw_account_id: self.spec.gw_account_id,
            side: self.spec.side,
            quantity: self.spec.quantity,
            limit_price: self.spec.limit_price,
            stop_price: self.spec.stop_price,
            description: state.description.clone(),
            placed: state.placed,
            is_final: state.is_final,
            filled: state.filled,
            internal: self.spec.internal,
        }
    }
}

impl GwObject for SimOrder {
    fn supports_error_info(&self) -> bool {
        true
    }

    fn error_description(&self) -> Option<String> {
        self.shared.upgrade().and_then(|shared| shared.error_description())
    }
}

impl GwOrder for SimOrder {
    fn guid(&self) -> GwResult<String> {
        Ok(self.guid.clone())
    }

    fn original_order_id(&self) -> GwResult<String> {
        Ok(self.spec.gw_order_id.clone())
    }

    fn instrument_name(&self) -> GwResult<String> {
        Ok(self.spec.symbol.clone())
    }

    fn account(&self) -> GwResult<AccountRef> {
        Ok(Arc::clone(&self.spec.account))
    }

    fn side(&self) -> GwResult<GwOrderSide> {
        Ok(self.spec.side)
    }

    fn is_final(&self) -> GwResult<bool> {
        Ok(self.state.lock().is_final)
    }

    fn quantity(&self) -> GwResult<i64> {
        Ok(self.spec.quantity)
    }

    fn filled_quantity(&self) -> GwResult<i64> {
        Ok(self.state.lock().filled)
    }

    fn description(&self) -> GwResult<String> {
        Ok(self.state.lock().description.clone())
    }

    fn set_description(&self, description: &str) -> GwResult<()> {
        upgrade(&self.shared)?.check(SimOp::SetDescription)?;
        self.state.lock().description = description.to_string();
        Ok(())
    }

    fn can_be_cancelled(&self) -> GwResult<bool> {
        Ok(self.is_working())
    }

    fn place(&self) -> GwResult<()> {
        let shared = upgrade(&self.shared)?;
        shared.check(SimOp::PlaceOrder)?;
        {
            let mut state = self.state.lock();
            if state.placed {
                return Err(ResultCode::UNEXPECTED);
            }
            state.placed = true;
        }

        let order = self.order_ref()?;
        log::debug!(
            "[sim] placed {:?} {} x{} ({})",
            self.spec.order_type,
            self.spec.symbol,
            self.spec.quantity,
            self.guid
        );
        shared.notify_order(OrderChangeType::Added, order, None, None);
        if self.is_market() && shared.fills_market_orders() {
            shared.fill_at_market(self)?;
        }
        Ok(())
    }

    fn cancel(&self) -> GwResult<()> {
        let shared = upgrade(&self.shared)?;
        shared.check(SimOp::CancelOrder)?;
        if !self.is_working() {
            return Err(ResultCode::UNEXPECTED);
        }
        self.finish();
        shared.notify_order(OrderChangeType::Changed, self.order_ref()?, None, None);
        Ok(())
    }
}
