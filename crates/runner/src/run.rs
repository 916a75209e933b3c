//! Event loop hosting the facade
//!
//! One task owns the facade and the simulated connector. Facade callbacks
//! only forward events into a channel; the loop pumps the connector on a
//! timer and feeds the forwarded events to the [`DemoSession`], so facade
//! calls never happen inside a callback.

use std::sync::Arc;
use std::time::Duration;

use cqg_facade::{EventForwarder, Facade, FacadeEvent};
use cqg_gateway_sim::SimGateway;
use log::{info, trace, warn};
use tokio::sync::mpsc;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::session::{DemoSession, Flow, SessionReport};

/// Run the demo until it completes, times out or is interrupted
pub async fn run(config: RunnerConfig) -> Result<SessionReport, RunnerError> {
    info!("Starting demo (facade {})", Facade::version());

    let sim = SimGateway::new(config.sim.clone());
    let mut facade = Facade::with_config(sim.factory(), config.connector.clone());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<FacadeEvent>();
    facade.initialize(Arc::new(EventForwarder::new(move |event| {
        if event_tx.send(event).is_err() {
            trace!("Event loop gone, dropping event");
        }
    })))?;

    let mut session = DemoSession::new(&config);
    let mut pump = tokio::time::interval(Duration::from_millis(config.pump_interval_ms.max(1)));
    let deadline = tokio::time::sleep(Duration::from_millis(config.run_duration_ms));
    tokio::pin!(deadline);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = pump.tick() => {
                let delivered = sim.pump();
                if delivered > 0 {
                    trace!("Delivered {} notifications", delivered);
                }
            }
            Some(event) = event_rx.recv() => {
                if session.handle(&mut facade, event) == Flow::Done {
                    info!("Demo complete");
                    break;
                }
            }
            _ = &mut deadline => {
                warn!("Run duration elapsed before the demo completed");
                break;
            }
            _ = &mut interrupt => {
                info!("Interrupted");
                break;
            }
        }
    }

    session.wind_down(&mut facade);
    facade.finalize();
    Ok(session.into_report())
}
