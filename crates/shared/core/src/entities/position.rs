use serde::{Deserialize, Serialize};

use crate::values::{INVALID_PRICE, MoneyAmount, Price, Quantity};

/// Open position snapshot for one account and instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionInfo {
    /// Full instrument name
    pub symbol: String,
    pub long_position: bool,
    /// Always non-negative, direction is carried by `long_position`
    pub quantity: Quantity,
    /// [`INVALID_PRICE`] until the gateway reports one
    pub average_price: Price,
    pub ote: MoneyAmount,
    pub profit_loss: MoneyAmount,
}

impl PositionInfo {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            long_position: false,
            quantity: 0,
            average_price: INVALID_PRICE,
            ote: 0.0,
            profit_loss: 0.0,
        }
    }

    pub fn has_average_price(&self) -> bool {
        self.average_price.is_finite()
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    /// Quantity signed by direction
    pub fn signed_quantity(&self) -> i64 {
        if self.long_position {
            i64::from(self.quantity)
        } else {
            -i64::from(self.quantity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_position_has_no_average_price() {
        let position = PositionInfo::new("F.US.CLEJ5");
        assert!(!position.has_average_price());
        assert!(position.is_flat());
    }

    #[test]
    fn test_signed_quantity() {
        let mut position = PositionInfo::new("F.US.CLEJ5");
        position.quantity = 3;
        assert_eq!(position.signed_quantity(), -3);

        position.long_position = true;
        assert_eq!(position.signed_quantity(), 3);
    }
}
