use serde::{Deserialize, Serialize};

use super::{Quote, QuoteType};

/// Resolved instrument with its latest quotes.
///
/// Each update delivers a fresh snapshot; snapshots are never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Canonical full instrument name, e.g. "F.US.EPH5"
    pub full_name: String,
    /// Latest quotes in gateway order
    pub last_quotes: Vec<Quote>,
}

impl SymbolInfo {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            last_quotes: Vec::new(),
        }
    }

    /// First quote of the given type, if the snapshot carries one
    pub fn quote(&self, quote_type: QuoteType) -> Option<&Quote> {
        self.last_quotes.iter().find(|q| q.quote_type == quote_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_lookup() {
        let mut info = SymbolInfo::new("F.US.EPH5");
        info.last_quotes.push(Quote::new(QuoteType::Bid, 2049.75, 12));
        info.last_quotes.push(Quote::new(QuoteType::Ask, 2050.0, 7));

        assert_eq!(info.quote(QuoteType::Ask).map(|q| q.volume), Some(7));
        assert!(info.quote(QuoteType::Trade).is_none());
    }
}
