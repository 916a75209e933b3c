use serde::{Deserialize, Serialize};

use crate::values::OrderPrice;

/// Order types accepted by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at current market price
    Market,
    /// Execute at specified price or better
    Limit,
    /// Market order triggered when price reaches stop price
    Stop,
    /// Limit order triggered when price reaches stop price
    StopLimit,
}

/// Limit and stop prices handed to the gateway for one order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRoles {
    pub limit: OrderPrice,
    pub stop: OrderPrice,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MKT",
            Self::Limit => "LMT",
            Self::Stop => "STP",
            Self::StopLimit => "STL",
        }
    }

    /// Route the caller's price arguments to gateway price roles.
    ///
    /// `price` is the limit price of a Limit order and the trigger of both
    /// stop kinds; a StopLimit takes its limit from `stop_limit_price`.
    pub fn price_roles(&self, price: OrderPrice, stop_limit_price: OrderPrice) -> PriceRoles {
        match self {
            Self::Market => PriceRoles {
                limit: OrderPrice::unset(),
                stop: OrderPrice::unset(),
            },
            Self::Limit => PriceRoles {
                limit: price,
                stop: OrderPrice::unset(),
            },
            Self::Stop => PriceRoles {
                limit: OrderPrice::unset(),
                stop: price,
            },
            Self::StopLimit => PriceRoles {
                limit: stop_limit_price,
                stop: price,
            },
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderType; 4] = [
        OrderType::Market,
        OrderType::Limit,
        OrderType::Stop,
        OrderType::StopLimit,
    ];

    #[test]
    fn test_price_roles_table() {
        let samples = [OrderPrice::unset(), OrderPrice::new(51.90)];

        for order_type in ALL {
            for price in samples {
                for stop_limit in samples {
                    let roles = order_type.price_roles(price, stop_limit);
                    let (limit, stop) = match order_type {
                        OrderType::Market => (OrderPrice::unset(), OrderPrice::unset()),
                        OrderType::Limit => (price, OrderPrice::unset()),
                        OrderType::Stop => (OrderPrice::unset(), price),
                        OrderType::StopLimit => (stop_limit, price),
                    };
                    assert_eq!(roles.limit, limit, "{order_type} limit");
                    assert_eq!(roles.stop, stop, "{order_type} stop");
                }
            }
        }
    }

    #[test]
    fn test_stop_limit_swaps_roles() {
        let roles = OrderType::StopLimit.price_roles(60.54.into(), 60.50.into());
        assert_eq!(roles.limit.or_zero(), 60.50);
        assert_eq!(roles.stop.or_zero(), 60.54);
    }

    #[test]
    fn test_market_ignores_supplied_prices() {
        let roles = OrderType::Market.price_roles(10.0.into(), 11.0.into());
        assert!(!roles.limit.is_set());
        assert!(!roles.stop.is_set());
        assert_eq!(roles.limit.or_zero(), 0.0);
    }
}
