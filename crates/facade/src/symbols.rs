//! Symbol Resolver & Quote Subscriber
//!
//! Builds [`SymbolInfo`] snapshots from subscribed instruments. Quotes of
//! unknown types, and quotes the gateway reports invalid, are dropped.

use cqg_core::{Quote, QuoteType, SymbolInfo};
use cqg_ports::{GwInstrument, GwQuote, QuoteRef, QuotesRef, RawQuoteType};

use crate::collection::iterate;
use crate::error::{GwResultExt, Result};

/// Host quote type for a raw gateway quote type
pub fn quote_type(raw: RawQuoteType) -> Option<QuoteType> {
    match raw {
        RawQuoteType::Ask => Some(QuoteType::Ask),
        RawQuoteType::Bid => Some(QuoteType::Bid),
        RawQuoteType::Trade => Some(QuoteType::Trade),
        RawQuoteType::YesterdaySettlement => Some(QuoteType::Close),
        RawQuoteType::DayHigh => Some(QuoteType::High),
        RawQuoteType::DayLow => Some(QuoteType::Low),
        _ => None,
    }
}

/// `Ok(None)` for invalid or unrecognized quotes
pub fn quote_info(quote: &dyn GwQuote) -> Result<Option<Quote>> {
    if !quote.is_valid() {
        return Ok(None);
    }

    let raw = quote.quote_type().describe_with(quote)?;
    let Some(quote_type) = quote_type(raw) else {
        return Ok(None);
    };

    Ok(Some(Quote::new(
        quote_type,
        quote.price().describe_with(quote)?,
        quote.volume().describe_with(quote)?,
    )))
}

/// Materialize every recognized quote, in collection order
pub fn collect_quotes(quotes: Option<&QuotesRef>) -> Result<Vec<Quote>> {
    let mut last_quotes = Vec::new();
    let Some(quotes) = quotes else {
        return Ok(last_quotes);
    };

    for item in iterate::<QuoteRef, _>(Some(&**quotes)).describe_with(&**quotes)? {
        let quote = item.describe_with(&**quotes)?;
        if let Some(info) = quote_info(&*quote)? {
            last_quotes.push(info);
        }
    }
    Ok(last_quotes)
}

/// Snapshot of an instrument keyed by its canonical full name
///
/// `quotes` is the changed-quotes collection of a change notification; when
/// `None` the instrument's own quotes are read.
pub fn symbol_info(instrument: &dyn GwInstrument, quotes: Option<&QuotesRef>) -> Result<SymbolInfo> {
    let mut symbol = SymbolInfo::new(instrument.full_name().describe_with(instrument)?);

    symbol.last_quotes = match quotes {
        Some(changed) => collect_quotes(Some(changed))?,
        None => {
            let all = instrument.quotes().describe_with(instrument)?;
            collect_quotes(Some(&all))?
        }
    };
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqg_core::{Price, Volume};
    use cqg_ports::{GwObject, GwResult, ResultCode};

    struct TestQuote {
        raw: RawQuoteType,
        valid: bool,
        price: GwResult<Price>,
    }

    impl GwObject for TestQuote {
        fn is_valid(&self) -> bool {
            self.valid
        }
    }

    impl GwQuote for TestQuote {
        fn quote_type(&self) -> GwResult<RawQuoteType> {
            Ok(self.raw)
        }

        fn price(&self) -> GwResult<Price> {
            self.price
        }

        fn volume(&self) -> GwResult<Volume> {
            Ok(3)
        }
    }

    fn quote(raw: RawQuoteType) -> TestQuote {
        TestQuote {
            raw,
            valid: true,
            price: Ok(101.25),
        }
    }

    #[test]
    fn test_quote_type_mapping() {
        assert_eq!(quote_type(RawQuoteType::Ask), Some(QuoteType::Ask));
        assert_eq!(quote_type(RawQuoteType::Bid), Some(QuoteType::Bid));
        assert_eq!(quote_type(RawQuoteType::Trade), Some(QuoteType::Trade));
        assert_eq!(
            quote_type(RawQuoteType::YesterdaySettlement),
            Some(QuoteType::Close)
        );
        assert_eq!(quote_type(RawQuoteType::DayHigh), Some(QuoteType::High));
        assert_eq!(quote_type(RawQuoteType::DayLow), Some(QuoteType::Low));
    }

    #[test]
    fn test_unknown_types_dropped() {
        for raw in [
            RawQuoteType::DayOpen,
            RawQuoteType::Settlement,
            RawQuoteType::ImpliedAsk,
            RawQuoteType::ImpliedBid,
            RawQuoteType::Other(42),
        ] {
            assert_eq!(quote_type(raw), None);
            assert_eq!(quote_info(&quote(raw)).unwrap(), None);
        }
    }

    #[test]
    fn test_invalid_quote_dropped() {
        let mut ask = quote(RawQuoteType::Ask);
        ask.valid = false;
        ask.price = Err(ResultCode::FAIL);
        assert_eq!(quote_info(&ask).unwrap(), None);
    }

    #[test]
    fn test_quote_read_failure_propagates() {
        let mut bid = quote(RawQuoteType::Bid);
        bid.price = Err(ResultCode::FAIL);
        assert!(quote_info(&bid).is_err());
    }

    #[test]
    fn test_quote_values() {
        let trade = quote_info(&quote(RawQuoteType::Trade)).unwrap().unwrap();
        assert_eq!(trade, Quote::new(QuoteType::Trade, 101.25, 3));
    }
}
