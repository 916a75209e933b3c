//! Scoped ownership of the gateway connector
//!
//! A started [`Connector`] is advised and running. Dropping it unadvises the
//! sink first, then shuts the connector down and releases it, so no
//! notification reaches a handler after release.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use cqg_ports::{ConnectorConfig, Gateway, GatewayFactory, NotificationSink};
use log::{info, warn};

use crate::error::{FacadeError, Result};
use crate::translate;

pub(crate) struct Connector {
    gateway: Arc<dyn Gateway>,
    advised: bool,
    started: bool,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown exception".to_string()
    }
}

impl Connector {
    /// Create, configure, advise and start a connector
    ///
    /// A factory panic is reported as an initialization failure. A failure
    /// after creation releases whatever was already set up.
    pub(crate) fn start(
        factory: &dyn GatewayFactory,
        config: &ConnectorConfig,
        sink: Box<dyn NotificationSink>,
    ) -> Result<Self> {
        let created = panic::catch_unwind(AssertUnwindSafe(|| factory.create()))
            .map_err(|payload| FacadeError::Initialization(panic_message(payload)))?;
        let gateway = created
            .map_err(|code| FacadeError::Initialization(translate::describe_code(code)))?;

        let mut connector = Self {
            gateway,
            advised: false,
            started: false,
        };
        let fail = |code, gateway: &dyn Gateway| {
            FacadeError::Initialization(translate::describe(code, Some(gateway)))
        };

        connector
            .gateway
            .configure(config)
            .map_err(|code| fail(code, connector.gateway.as_ref()))?;

        connector
            .gateway
            .advise(sink)
            .map_err(|code| fail(code, connector.gateway.as_ref()))?;
        connector.advised = true;

        connector
            .gateway
            .startup()
            .map_err(|code| fail(code, connector.gateway.as_ref()))?;
        connector.started = true;

        info!("Gateway connector started");
        Ok(connector)
    }

    pub(crate) fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        if self.advised {
            if let Err(code) = self.gateway.unadvise() {
                warn!("Unadvise failed: {}", translate::describe_code(code));
            }
        }
        if self.started {
            if let Err(code) = self.gateway.shutdown() {
                warn!("Connector shutdown failed: {}", translate::describe_code(code));
            }
        }
        info!("Gateway connector released");
    }
}
