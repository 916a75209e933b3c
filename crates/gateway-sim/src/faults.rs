//! Fault injection

use std::collections::HashMap;

use cqg_ports::{GwResult, ResultCode};
use serde::{Deserialize, Serialize};

/// Simulator operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimOp {
    Create,
    Configure,
    Advise,
    Startup,
    Logon,
    SubscribeAccounts,
    NewInstrument,
    Instruments,
    Accounts,
    AccountSummary,
    Positions,
    Orders,
    CreateOrder,
    SetDescription,
    PlaceOrder,
    CancelOrder,
    CancelAll,
    CreateBarsRequest,
    RequestBars,
    Environment,
}

#[derive(Debug, Clone)]
struct Fault {
    code: ResultCode,
    description: Option<String>,
}

/// Pending faults, each consumed by the next matching call
#[derive(Debug, Default)]
pub(crate) struct Faults {
    next: HashMap<SimOp, Fault>,
    /// Next order enumeration fails at this index
    enumeration: Option<(usize, ResultCode)>,
    /// Rich description of the last injected failure
    last_description: Option<String>,
}

impl Faults {
    pub(crate) fn fail_next(&mut self, op: SimOp, code: ResultCode, description: Option<String>) {
        self.next.insert(op, Fault { code, description });
    }

    pub(crate) fn fail_enumeration_at(&mut self, index: usize, code: ResultCode) {
        self.enumeration = Some((index, code));
    }

    pub(crate) fn take_enumeration(&mut self) -> Option<(usize, ResultCode)> {
        self.enumeration.take()
    }

    /// Consume the fault armed for `op`, if any
    pub(crate) fn check(&mut self, op: SimOp) -> GwResult<()> {
        match self.next.remove(&op) {
            Some(fault) => {
                self.last_description = fault.description;
                Err(fault.code)
            }
            None => Ok(()),
        }
    }

    pub(crate) fn last_description(&self) -> Option<String> {
        self.last_description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_fires_once() {
        let mut faults = Faults::default();
        faults.fail_next(SimOp::PlaceOrder, ResultCode::FAIL, Some("rejected".into()));

        assert_eq!(faults.check(SimOp::CancelOrder), Ok(()));
        assert_eq!(faults.check(SimOp::PlaceOrder), Err(ResultCode::FAIL));
        assert_eq!(faults.last_description().as_deref(), Some("rejected"));
        assert_eq!(faults.check(SimOp::PlaceOrder), Ok(()));
    }
}
