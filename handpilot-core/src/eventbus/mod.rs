//! src/eventbus/mod.rs
//!
//! What the pilot loop did and what it refused to do, fanned out to the
//! logger and any other listener, plus the shutdown flag all workers watch.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use handpilot_common::models::{
    Command, Completion, EventSource, Gesture, GestureEvent, IssuedCommand, VehicleState,
};

/// Everything the gesture loop reports.
#[derive(Debug, Clone)]
pub enum PilotEvent {
    /// A stable gesture reached the dispatcher.
    GestureDetected(GestureEvent),

    /// The dispatcher handed a command to the vehicle.
    CommandIssued(IssuedCommand),

    /// The vehicle reported success for a previously issued command.
    CommandCompleted {
        command: IssuedCommand,
        completion: Completion,
        state: VehicleState,
    },

    /// The vehicle reported failure; `state` is the state after reverting.
    CommandFailed {
        command: IssuedCommand,
        completion: Completion,
        state: VehicleState,
    },

    /// A gesture was dropped because the vehicle state does not allow its command.
    CommandRejected {
        gesture: Gesture,
        source: EventSource,
        command: Command,
        state: VehicleState,
    },

    /// The remote channel received a token outside its vocabulary.
    UnrecognizedGesture {
        token: String,
        timestamp: DateTime<Utc>,
    },

    /// A named telemetry sample the core cares about (currently only `Alt`).
    Telemetry {
        vehicle_id: u8,
        name: String,
        value: f32,
    },

    /// Accept/read failures and disconnects on the remote channel.
    ChannelError(String),

    SystemMessage(String),
}

impl PilotEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            PilotEvent::GestureDetected(_) => "gesture.detected",
            PilotEvent::CommandIssued(_) => "command.issued",
            PilotEvent::CommandCompleted { .. } => "command.completed",
            PilotEvent::CommandFailed { .. } => "command.failed",
            PilotEvent::CommandRejected { .. } => "command.rejected",
            PilotEvent::UnrecognizedGesture { .. } => "gesture.unrecognized",
            PilotEvent::Telemetry { .. } => "telemetry",
            PilotEvent::ChannelError(_) => "channel.error",
            PilotEvent::SystemMessage(_) => "system_message",
        }
    }
}

/// One registered listener. Its queue is bounded, so a slow listener
/// holds back `publish` instead of losing pilot events.
struct Subscriber {
    name: &'static str,
    tx: mpsc::Sender<PilotEvent>,
}

/// Fan-out of `PilotEvent`s plus the process-wide shutdown flag.
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            subscribers: Mutex::new(Vec::new()),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Registers a listener with room for `capacity` undelivered events.
    pub fn subscribe(&self, name: &'static str, capacity: usize) -> mpsc::Receiver<PilotEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.subscribers.lock().push(Subscriber { name, tx });
        debug!("event bus: '{}' subscribed", name);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Delivers `event` to every live listener, in subscription order, and
    /// returns how many received it. Listeners whose receiver is gone are
    /// dropped from the bus.
    pub async fn publish(&self, event: PilotEvent) -> usize {
        let targets: Vec<(&'static str, mpsc::Sender<PilotEvent>)> = self
            .subscribers
            .lock()
            .iter()
            .map(|s| (s.name, s.tx.clone()))
            .collect();

        let mut delivered = 0;
        let mut gone = Vec::new();
        for (name, tx) in targets {
            match tx.send(event.clone()).await {
                Ok(()) => delivered += 1,
                Err(_) => gone.push(name),
            }
        }

        if !gone.is_empty() {
            debug!("event bus: dropping closed listener(s) {:?}", gone);
            self.subscribers.lock().retain(|s| !s.tx.is_closed());
        }
        delivered
    }

    /// Flips the shutdown flag; every worker watching it winds down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// A receiver that sees the flip even if shutdown already happened.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_signal()
    }
}
