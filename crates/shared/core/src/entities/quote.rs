use serde::{Deserialize, Serialize};

use crate::values::{Price, Volume};

/// Quote kinds the facade republishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteType {
    /// Best ask
    Ask,
    /// Best bid
    Bid,
    /// Last trade
    Trade,
    /// Previous session settlement
    Close,
    /// Session high
    High,
    /// Session low
    Low,
}

impl QuoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Bid => "bid",
            Self::Trade => "trade",
            Self::Close => "close",
            Self::High => "high",
            Self::Low => "low",
        }
    }

    /// Best bid/ask quotes, as opposed to trade-derived ones
    pub fn is_bba(&self) -> bool {
        matches!(self, Self::Ask | Self::Bid)
    }
}

/// Single quote snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_type: QuoteType,
    pub price: Price,
    pub volume: Volume,
}

impl Quote {
    pub fn new(quote_type: QuoteType, price: Price, volume: Volume) -> Self {
        Self {
            quote_type,
            price,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bba_classification() {
        assert!(QuoteType::Ask.is_bba());
        assert!(QuoteType::Bid.is_bba());
        assert!(!QuoteType::Trade.is_bba());
        assert!(!QuoteType::Close.is_bba());
    }

    #[test]
    fn test_quote_type_names() {
        assert_eq!(QuoteType::Close.as_str(), "close");
        assert_eq!(QuoteType::Low.as_str(), "low");
    }
}
