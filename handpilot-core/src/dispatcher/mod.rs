//! handpilot-core/src/dispatcher/mod.rs
//!
//! Gesture -> vehicle command dispatch. A single actor task owns the
//! `VehicleState`; every producer (frame worker, remote channel, console)
//! and every completion callback talks to it through one unbounded queue, so
//! gate, optimistic transition and issue happen as one step with no locks.

pub mod table;

pub use table::{command_for, DispatcherConfig, Mapping};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use handpilot_common::models::{
    Command, Completion, EventSource, Gesture, GestureEvent, IssuedCommand, VehicleState,
};
use handpilot_common::traits::{CompletionCallback, VehicleControl};
use handpilot_common::Error;

use crate::eventbus::{EventBus, PilotEvent};
use crate::telemetry::TelemetryTracker;

/// Messages the dispatcher actor understands.
#[derive(Debug)]
enum DispatcherMessage {
    Gesture(GestureEvent),
    Connect {
        target: String,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Completed {
        id: u64,
        completion: Completion,
    },
    State(oneshot::Sender<VehicleState>),
    Shutdown,
}

/// Resulting state once a takeoff/land completion arrives.
/// Non-transition states are returned unchanged.
pub fn settle(state: VehicleState, success: bool) -> VehicleState {
    match (state, success) {
        (VehicleState::TakingOff, true) => VehicleState::Airborne,
        (VehicleState::TakingOff, false) => VehicleState::Grounded,
        (VehicleState::Landing, true) => VehicleState::Grounded,
        (VehicleState::Landing, false) => VehicleState::Airborne,
        (other, _) => other,
    }
}

/// Builder for the dispatcher actor.
pub struct Dispatcher {
    vehicle: Arc<dyn VehicleControl>,
    bus: Arc<EventBus>,
    config: DispatcherConfig,
    telemetry: Option<TelemetryTracker>,
}

impl Dispatcher {
    pub fn new(
        vehicle: Arc<dyn VehicleControl>,
        bus: Arc<EventBus>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            vehicle,
            bus,
            config,
            telemetry: None,
        }
    }

    /// Registers `tracker` on the vehicle's telemetry feed after a successful connect.
    pub fn with_telemetry(mut self, tracker: TelemetryTracker) -> Self {
        self.telemetry = Some(tracker);
        self
    }

    /// Starts the actor on the current tokio runtime.
    pub fn spawn(self) -> DispatcherHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = DispatcherActor {
            vehicle: self.vehicle,
            bus: self.bus,
            config: self.config,
            telemetry: self.telemetry,
            state: VehicleState::Grounded,
            next_id: 1,
            in_flight: HashMap::new(),
            self_tx: tx.downgrade(),
        };
        let task = tokio::spawn(actor.run(rx));
        DispatcherHandle {
            tx,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }
}

/// Cheap, cloneable entry point to the dispatcher. `dispatch` never blocks
/// and may be called from sync threads as well as async tasks.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<DispatcherMessage>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DispatcherHandle {
    pub fn dispatch(&self, event: GestureEvent) {
        trace!("dispatch {} from {}", event.gesture, event.source);
        if self.tx.send(DispatcherMessage::Gesture(event)).is_err() {
            warn!("dispatcher is not running; gesture dropped");
        }
    }

    pub async fn connect(&self, target: &str) -> Result<(), Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(DispatcherMessage::Connect {
                target: target.to_string(),
                reply: reply_tx,
            })
            .map_err(|_| Error::Dispatcher("dispatcher is not running".into()))?;
        reply_rx
            .await
            .map_err(|_| Error::Dispatcher("connect request was dropped".into()))?
    }

    /// Current vehicle state, answered after everything queued before it.
    pub async fn state(&self) -> Result<VehicleState, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(DispatcherMessage::State(reply_tx))
            .map_err(|_| Error::Dispatcher("dispatcher is not running".into()))?;
        reply_rx
            .await
            .map_err(|_| Error::Dispatcher("state request was dropped".into()))
    }

    /// Stops the actor and waits for it. In-flight vehicle commands are not cancelled.
    pub async fn shutdown(&self) -> Result<(), Error> {
        let _ = self.tx.send(DispatcherMessage::Shutdown);
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            task.await
                .map_err(|e| Error::Dispatcher(format!("dispatcher task failed: {e}")))?;
        }
        Ok(())
    }
}

struct DispatcherActor {
    vehicle: Arc<dyn VehicleControl>,
    bus: Arc<EventBus>,
    config: DispatcherConfig,
    telemetry: Option<TelemetryTracker>,
    state: VehicleState,
    next_id: u64,
    /// Takeoff and land are gated on a settled state, so at most one of
    /// them is in here at a time.
    in_flight: HashMap<u64, IssuedCommand>,
    self_tx: mpsc::WeakUnboundedSender<DispatcherMessage>,
}

impl DispatcherActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<DispatcherMessage>) {
        let mut shutdown_rx = self.bus.shutdown_signal();
        info!("Dispatcher started in state {}", self.state);

        loop {
            tokio::select! {
                biased;
                Ok(_) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Dispatcher: global shutdown");
                        break;
                    }
                }
                msg = rx.recv() => {
                    match msg {
                        Some(DispatcherMessage::Shutdown) | None => break,
                        Some(msg) => self.handle(msg).await,
                    }
                }
            }
        }

        if !self.in_flight.is_empty() {
            debug!("Dispatcher exiting with {} command(s) in flight", self.in_flight.len());
        }
        info!("Dispatcher stopped in state {}", self.state);
    }

    async fn handle(&mut self, msg: DispatcherMessage) {
        match msg {
            DispatcherMessage::Gesture(event) => self.on_gesture(event).await,
            DispatcherMessage::Connect { target, reply } => {
                let res = self.on_connect(&target).await;
                let _ = reply.send(res);
            }
            DispatcherMessage::Completed { id, completion } => {
                self.on_completed(id, completion).await
            }
            DispatcherMessage::State(reply) => {
                let _ = reply.send(self.state);
            }
            DispatcherMessage::Shutdown => {}
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    async fn on_gesture(&mut self, event: GestureEvent) {
        self.bus.publish(PilotEvent::GestureDetected(event.clone())).await;

        let Some(mapping) = command_for(event.gesture, &self.config) else {
            return;
        };

        if self.state != mapping.requires {
            debug!(
                "Rejecting {} ({}) from {}: vehicle is {}",
                mapping.command, event.gesture, event.source, self.state
            );
            self.bus
                .publish(PilotEvent::CommandRejected {
                    gesture: event.gesture,
                    source: event.source,
                    command: mapping.command,
                    state: self.state,
                })
                .await;
            return;
        }

        let id = self.next_id();
        match mapping.command {
            Command::Takeoff { .. } => self.state = VehicleState::TakingOff,
            Command::Land => self.state = VehicleState::Landing,
            _ => {}
        }

        let issued = IssuedCommand {
            id,
            command: mapping.command,
            gesture: event.gesture,
            source: event.source,
            blocking: false,
        };
        info!("Issuing #{} {} ({} via {})", id, issued.command, issued.gesture, issued.source);
        self.in_flight.insert(id, issued.clone());
        self.bus.publish(PilotEvent::CommandIssued(issued.clone())).await;
        self.issue(id, &issued.command);
    }

    fn completion_callback(&self, id: u64) -> CompletionCallback {
        let tx = self.self_tx.clone();
        Box::new(move |completion: Completion| {
            match tx.upgrade() {
                Some(tx) => {
                    let _ = tx.send(DispatcherMessage::Completed { id, completion });
                }
                None => trace!("completion for #{} after dispatcher exit", id),
            }
        })
    }

    fn issue(&self, id: u64, command: &Command) {
        let on_complete = self.completion_callback(id);
        match command {
            Command::Takeoff { altitude } => self.vehicle.takeoff(*altitude, on_complete),
            Command::Land => self.vehicle.land(on_complete),
            Command::SetHeading { degrees } => self.vehicle.set_heading(*degrees, on_complete),
            Command::Move { direction, distance } => {
                self.vehicle.move_to(*direction, *distance, on_complete)
            }
            Command::Connect { .. } => {
                warn!("connect is not issued through the gesture path");
            }
        }
    }

    async fn on_connect(&mut self, target: &str) -> Result<(), Error> {
        let id = self.next_id();
        let issued = IssuedCommand {
            id,
            command: Command::Connect { target: target.to_string() },
            gesture: Gesture::None,
            source: EventSource::Manual,
            blocking: false,
        };
        info!("Connecting to vehicle target '{}'", target);
        self.bus.publish(PilotEvent::CommandIssued(issued.clone())).await;

        match self.vehicle.connect(target).await {
            Ok(()) => {
                if let Some(tracker) = &self.telemetry {
                    self.vehicle.send_telemetry(tracker.callback());
                }
                self.bus
                    .publish(PilotEvent::CommandCompleted {
                        command: issued,
                        completion: Completion::succeeded(0, "connected"),
                        state: self.state,
                    })
                    .await;
                Ok(())
            }
            Err(e) => {
                warn!("Connect to '{}' failed: {}", target, e);
                self.bus
                    .publish(PilotEvent::CommandFailed {
                        command: issued,
                        completion: Completion::failed(0, e.to_string()),
                        state: self.state,
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn on_completed(&mut self, id: u64, completion: Completion) {
        let Some(command) = self.in_flight.remove(&id) else {
            debug!("Ignoring completion for unknown command #{}", id);
            return;
        };

        if matches!(command.command, Command::Takeoff { .. } | Command::Land) {
            let before = self.state;
            self.state = settle(before, completion.success);
            debug!("#{} {}: {} -> {}", id, command.command, before, self.state);
        }

        if completion.success {
            info!(
                "#{} {} completed ({})",
                id,
                command.command,
                completion.status.as_deref().unwrap_or("ok")
            );
            self.bus
                .publish(PilotEvent::CommandCompleted {
                    command,
                    completion,
                    state: self.state,
                })
                .await;
        } else {
            warn!(
                "#{} {} failed ({}); vehicle is {}",
                id,
                command.command,
                completion.status.as_deref().unwrap_or("no status"),
                self.state
            );
            self.bus
                .publish(PilotEvent::CommandFailed {
                    command,
                    completion,
                    state: self.state,
                })
                .await;
        }
    }
}
