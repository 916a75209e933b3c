//! Account/Position Synchronizer
//!
//! Account and position snapshots, read fresh from the gateway on every call.

use cqg_core::{AccountInfo, Id, INVALID_PRICE, PositionInfo, Quantity};
use cqg_ports::{
    AccountRef, Gateway, GwAccount, GwOrderSide, GwPosition, PositionRef,
};
use log::debug;

use crate::collection::iterate;
use crate::error::{FacadeError, GwResultExt, Result};

/// Money fields of an account summary are read for the reporting currency
const REPORTING_CURRENCY: usize = 0;

/// Full account snapshot; money fields fall back to 0 when the summary is
/// unavailable
pub fn account_info(account: &dyn GwAccount) -> Result<AccountInfo> {
    let mut info = AccountInfo {
        fcm_id: account.fcm_id().describe_with(account)?,
        fcm_account_id: account.fcm_account_id().describe_with(account)?,
        gw_account_id: account.gw_account_id().describe_with(account)?,
        gw_account_name: account.gw_account_name().describe_with(account)?,
        currency: account.reporting_currency().describe_with(account)?,
        balance: 0.0,
        ote: 0.0,
        profit_loss: 0.0,
    };

    match account.summary() {
        Ok(summary) => {
            info.balance = summary.balance(REPORTING_CURRENCY).unwrap_or(0.0);
            info.ote = summary.ote(REPORTING_CURRENCY).unwrap_or(0.0);
            info.profit_loss = summary.profit_loss(REPORTING_CURRENCY).unwrap_or(0.0);
        }
        Err(code) => {
            debug!(
                "Summary unavailable for account {}: {}",
                info.gw_account_id, code
            );
        }
    }

    Ok(info)
}

pub fn position_info(position: &dyn GwPosition) -> Result<PositionInfo> {
    let mut info = PositionInfo::new(position.instrument_name().describe_with(position)?);

    info.long_position = position.side().describe_with(position)? == GwOrderSide::Buy;
    info.quantity = to_quantity(position.quantity().describe_with(position)?);
    info.average_price = position.average_price().unwrap_or(INVALID_PRICE);
    info.ote = position.ote().unwrap_or(0.0);
    info.profit_loss = position.profit_loss().unwrap_or(0.0);

    Ok(info)
}

/// Gateway quantities are signed; snapshots carry the magnitude
pub(crate) fn to_quantity(raw: i64) -> Quantity {
    Quantity::try_from(raw.unsigned_abs()).unwrap_or(Quantity::MAX)
}

/// Every account with freshly queried summary fields
pub fn list_accounts(gateway: &dyn Gateway) -> Result<Vec<AccountInfo>> {
    let accounts = gateway.accounts().describe_with(gateway)?;
    let mut result = Vec::with_capacity(accounts.count().unwrap_or(0));

    for item in iterate::<AccountRef, _>(Some(&*accounts)).describe_with(&*accounts)? {
        let account = item.describe_with(&*accounts)?;
        result.push(account_info(&*account)?);
    }
    Ok(result)
}

/// Look an account up by gateway id; unknown ids fail
pub fn find_account(gateway: &dyn Gateway, gw_account_id: Id) -> Result<AccountRef> {
    let accounts = gateway.accounts().describe_with(gateway)?;
    accounts
        .item(gw_account_id)
        .describe_with(&*accounts)?
        .ok_or(FacadeError::AccountNotFound(gw_account_id))
}

/// Positions held under one account
pub fn list_positions(gateway: &dyn Gateway, gw_account_id: Id) -> Result<Vec<PositionInfo>> {
    let account = find_account(gateway, gw_account_id)?;
    let positions = account.positions().describe_with(&*account)?;
    let mut result = Vec::with_capacity(positions.count().unwrap_or(0));

    for item in iterate::<PositionRef, _>(Some(&*positions)).describe_with(&*positions)? {
        let position = item.describe_with(&*positions)?;
        result.push(position_info(&*position)?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqg_core::Price;
    use cqg_ports::{GwObject, GwResult, ResultCode};

    struct TestPosition {
        quantity: i64,
        side: GwOrderSide,
        average_price: GwResult<Price>,
    }

    impl GwObject for TestPosition {}

    impl GwPosition for TestPosition {
        fn instrument_name(&self) -> GwResult<String> {
            Ok("F.US.EPH5".to_string())
        }

        fn side(&self) -> GwResult<GwOrderSide> {
            Ok(self.side)
        }

        fn quantity(&self) -> GwResult<i64> {
            Ok(self.quantity)
        }

        fn average_price(&self) -> GwResult<Price> {
            self.average_price
        }

        fn ote(&self) -> GwResult<f64> {
            Err(ResultCode::FAIL)
        }

        fn profit_loss(&self) -> GwResult<f64> {
            Ok(12.5)
        }
    }

    #[test]
    fn test_position_defaults_on_failure() {
        let position = TestPosition {
            quantity: 3,
            side: GwOrderSide::Sell,
            average_price: Err(ResultCode::FAIL),
        };
        let info = position_info(&position).unwrap();

        assert_eq!(info.symbol, "F.US.EPH5");
        assert!(!info.long_position);
        assert_eq!(info.quantity, 3);
        assert!(!info.has_average_price());
        assert_eq!(info.ote, 0.0);
        assert_eq!(info.profit_loss, 12.5);
    }

    #[test]
    fn test_position_quantity_is_magnitude() {
        let position = TestPosition {
            quantity: -2,
            side: GwOrderSide::Buy,
            average_price: Ok(4500.25),
        };
        let info = position_info(&position).unwrap();

        assert!(info.long_position);
        assert_eq!(info.quantity, 2);
        assert_eq!(info.average_price, 4500.25);
    }

    #[test]
    fn test_to_quantity_saturates() {
        assert_eq!(to_quantity(i64::MIN), Quantity::MAX);
        assert_eq!(to_quantity(0), 0);
    }
}
