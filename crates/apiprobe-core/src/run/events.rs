//! Run observation: an explicit event-sink interface injected into the
//! orchestrator, instead of any process-wide output interception.

use tracing::info;

/// Progress events emitted while a run executes.
#[derive(Debug, Clone)]
pub enum EvalEvent {
    RunStarted {
        total_endpoints: usize,
    },
    EndpointStarted {
        method: String,
        path: String,
    },
    EndpointFinished {
        method: String,
        path: String,
        success: bool,
        status: Option<u16>,
    },
    RunFinished {
        success_rate: f64,
        successful_endpoints: usize,
        total_endpoints: usize,
    },
}

/// Observer seam for live viewers. Implementations must tolerate being
/// called from multiple endpoint tasks at once.
pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &EvalEvent);
}

/// Discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: &EvalEvent) {}
}

/// Forwards events to the tracing subscriber.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: &EvalEvent) {
        match event {
            EvalEvent::RunStarted { total_endpoints } => {
                info!(total_endpoints, "starting evaluation run");
            }
            EvalEvent::EndpointStarted { method, path } => {
                info!(%method, %path, "testing endpoint");
            }
            EvalEvent::EndpointFinished {
                method,
                path,
                success,
                status,
            } => {
                info!(%method, %path, success, status = status.unwrap_or(0), "endpoint finished");
            }
            EvalEvent::RunFinished {
                success_rate,
                successful_endpoints,
                total_endpoints,
            } => {
                info!(
                    success_rate,
                    successful_endpoints, total_endpoints, "evaluation complete"
                );
            }
        }
    }
}
