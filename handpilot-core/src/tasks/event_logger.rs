//! handpilot-core/src/tasks/event_logger.rs
//!
//! Subscribes to the EventBus and writes every PilotEvent to the tracing
//! log. Drains whatever is queued on shutdown before exiting.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::eventbus::{EventBus, PilotEvent};

/// Subscribes first, then spawns, so no event published after this returns is missed.
pub fn spawn_event_logger(event_bus: &EventBus, buffer_size: usize) -> JoinHandle<()> {
    let rx = event_bus.subscribe("event-logger", buffer_size);
    let shutdown_rx = event_bus.shutdown_signal();
    tokio::spawn(run(rx, shutdown_rx))
}

async fn run(
    mut rx: mpsc::Receiver<PilotEvent>,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event) => log_event(&event),
                    None => break,
                }
            }
            Ok(_) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    while let Ok(event) = rx.try_recv() {
        log_event(&event);
    }
    debug!("Event logger exited");
}

pub fn log_event(event: &PilotEvent) {
    let kind = event.event_type();
    match event {
        PilotEvent::GestureDetected(e) => {
            debug!(event = kind, "{} from {}", e.gesture, e.source)
        }
        PilotEvent::CommandIssued(c) => {
            info!(event = kind, "#{} {} ({} via {})", c.id, c.command, c.gesture, c.source)
        }
        PilotEvent::CommandCompleted { command, completion, state } => info!(
            event = kind,
            "#{} {} ok [{}] => {}",
            command.id,
            command.command,
            completion.status.as_deref().unwrap_or(""),
            state
        ),
        PilotEvent::CommandFailed { command, completion, state } => warn!(
            event = kind,
            "#{} {} failed [{}] => {}",
            command.id,
            command.command,
            completion.status.as_deref().unwrap_or(""),
            state
        ),
        PilotEvent::CommandRejected { gesture, source, command, state } => info!(
            event = kind,
            "{} from {} ignored: {} not allowed while {}",
            gesture, source, command, state
        ),
        PilotEvent::UnrecognizedGesture { token, .. } => {
            warn!(event = kind, "unrecognized gesture token '{}'", token)
        }
        PilotEvent::Telemetry { vehicle_id, name, value } => {
            debug!(event = kind, "vehicle {} {}={}", vehicle_id, name, value)
        }
        PilotEvent::ChannelError(msg) => warn!(event = kind, "{}", msg),
        PilotEvent::SystemMessage(msg) => info!(event = kind, "{}", msg),
    }
}
