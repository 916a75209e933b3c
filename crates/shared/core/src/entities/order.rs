use serde::{Deserialize, Serialize};

use crate::values::{Id, Price, Quantity, Volume};

/// One execution leg of a fill.
///
/// The symbol can differ from the order symbol for spread legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillInfo {
    /// Set when the fill batch was canceled or busted
    pub canceled: bool,
    pub symbol: String,
    pub fill_price: Price,
    pub fill_qty: Volume,
}

/// Order snapshot delivered on every order change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderInfo {
    /// Client correlation key, never changes
    pub order_guid: String,
    /// Broker-assigned order id, may differ from the GUID
    pub gw_order_id: String,
    pub symbol: String,
    pub gw_account_id: Id,
    pub buy: bool,
    /// No longer working: filled, canceled or rejected
    pub is_final: bool,
    pub quantity: Quantity,
    pub filled_qty: Quantity,
    /// Last error description, empty when none
    pub error: String,
    /// Legs of the last fill
    pub fills: Vec<FillInfo>,
    /// User description kept by the gateway for the order's lifetime
    pub description: String,
}

impl OrderInfo {
    pub fn is_working(&self) -> bool {
        !self.is_final
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity.saturating_sub(self.filled_qty)
    }

    /// Returns true if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.quantity > 0 && self.filled_qty >= self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_fill_progress() {
        let order = OrderInfo {
            order_guid: "guid-1".to_string(),
            quantity: 5,
            filled_qty: 2,
            ..Default::default()
        };

        assert!(order.is_working());
        assert!(!order.is_filled());
        assert_eq!(order.remaining_quantity(), 3);
    }

    #[test]
    fn test_rejected_order_is_final_with_error() {
        let order = OrderInfo {
            quantity: 1,
            is_final: true,
            error: "Insufficient margin".to_string(),
            ..Default::default()
        };

        assert!(!order.is_working());
        assert!(order.has_error());
        assert!(!order.is_filled());
    }
}
