use serde::{Deserialize, Serialize};

use crate::values::{Id, MoneyAmount};

/// Trading account snapshot.
///
/// `gw_account_id` is the stable key. Money fields are 0 when the
/// gateway summary could not be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub fcm_id: Id,
    pub fcm_account_id: String,
    pub gw_account_id: Id,
    pub gw_account_name: String,
    pub currency: String,
    pub balance: MoneyAmount,
    /// Open Trade Equity
    pub ote: MoneyAmount,
    pub profit_loss: MoneyAmount,
}
