use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Price value as reported by the gateway
pub type Price = f64;

/// Money amount (balance, OTE, P/L)
pub type MoneyAmount = f64;

/// Traded volume
pub type Volume = i64;

/// Gateway-side numeric identifier (FCM id, gateway account id)
pub type Id = i64;

/// Order and position quantity
pub type Quantity = u32;

/// Line Time timestamp (venue time, no zone attached)
pub type Timestamp = NaiveDateTime;

/// Reported price that has not been set
pub const INVALID_PRICE: Price = f64::INFINITY;

/// Reported money amount that has not been set
pub const INVALID_MONEY_AMOUNT: MoneyAmount = f64::INFINITY;

/// Reported volume that has not been set
pub const INVALID_VOLUME: Volume = -1;

/// Order price parameter that may or may not be supplied.
///
/// Submission-time optionality only. Prices reported back by the gateway
/// use [`INVALID_PRICE`] instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPrice(Option<Price>);

impl OrderPrice {
    /// Price that was not supplied
    pub const fn unset() -> Self {
        Self(None)
    }

    pub const fn new(price: Price) -> Self {
        Self(Some(price))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn price(&self) -> Option<Price> {
        self.0
    }

    /// Value passed to the gateway: the price, or 0.0 when unset
    pub fn or_zero(&self) -> Price {
        self.0.unwrap_or(0.0)
    }
}

impl From<Price> for OrderPrice {
    fn from(price: Price) -> Self {
        Self::new(price)
    }
}

impl From<Option<Price>> for OrderPrice {
    fn from(price: Option<Price>) -> Self {
        Self(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_price_maps_to_zero() {
        let price = OrderPrice::unset();
        assert!(!price.is_set());
        assert_eq!(price.price(), None);
        assert_eq!(price.or_zero(), 0.0);
    }

    #[test]
    fn test_set_zero_is_still_set() {
        let price = OrderPrice::from(0.0);
        assert!(price.is_set());
        assert_eq!(price.price(), Some(0.0));
    }

    #[test]
    fn test_sentinels_are_not_finite() {
        assert!(!INVALID_PRICE.is_finite());
        assert!(!INVALID_MONEY_AMOUNT.is_finite());
        assert!(INVALID_VOLUME < 0);
    }
}
