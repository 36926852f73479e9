// File: handpilot-server/src/console.rs
//
// Manual override console. Runs on its own OS thread, reads stdin line by
// line and feeds the same dispatcher as the camera and network sources.

use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::thread;
use tokio::runtime::Handle;

use handpilot_common::models::{EventSource, Gesture, GestureEvent};
use handpilot_core::dispatcher::DispatcherHandle;
use handpilot_core::eventbus::EventBus;
use handpilot_core::telemetry::TelemetryTracker;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Connect(Option<String>),
    Gesture(Gesture),
    Status,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next()?.to_lowercase();
    let cmd = match cmd.as_str() {
        "help" | "?" => ConsoleCommand::Help,
        "connect" => ConsoleCommand::Connect(parts.next().map(str::to_string)),
        "takeoff" => ConsoleCommand::Gesture(Gesture::Palm),
        "land" => ConsoleCommand::Gesture(Gesture::Fist),
        "status" => ConsoleCommand::Status,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => match other.parse::<Gesture>().ok().or_else(|| Gesture::from_wire(other)) {
            Some(g) => ConsoleCommand::Gesture(g),
            None => ConsoleCommand::Unknown(other.to_string()),
        },
    };
    Some(cmd)
}

pub struct ManualConsole {
    dispatcher: DispatcherHandle,
    bus: Arc<EventBus>,
    telemetry: TelemetryTracker,
    default_target: String,
    runtime: Handle,
}

impl ManualConsole {
    pub fn new(
        dispatcher: DispatcherHandle,
        bus: Arc<EventBus>,
        telemetry: TelemetryTracker,
        default_target: String,
        runtime: Handle,
    ) -> Self {
        Self {
            dispatcher,
            bus,
            telemetry,
            default_target,
            runtime,
        }
    }

    /// Spawns the stdin loop on a background thread and returns immediately.
    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            println!("Manual console enabled. Type 'help' for commands.");
            let mut reader = BufReader::new(std::io::stdin());

            loop {
                print!("pilot> ");
                let _ = std::io::stdout().flush();

                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("Error reading from stdin: {}", e);
                        break;
                    }
                }
                if self.bus.is_shutdown() {
                    break;
                }
                let Some(cmd) = parse_command(&line) else {
                    continue;
                };
                if !self.execute(cmd) {
                    break;
                }
            }
        })
    }

    /// Returns `false` when the console should stop.
    fn execute(&self, cmd: ConsoleCommand) -> bool {
        match cmd {
            ConsoleCommand::Help => {
                println!("Commands:");
                println!("  connect [target]  - connect the vehicle (default '{}')", self.default_target);
                println!("  takeoff | land    - same as palm | fist");
                println!("  <gesture>         - none, fist, one, two, three, palm (or puño, uno, dos, tres)");
                println!("  status            - vehicle state and altitude");
                println!("  quit              - shut everything down");
            }
            ConsoleCommand::Connect(target) => {
                let target = target.unwrap_or_else(|| self.default_target.clone());
                match self.runtime.block_on(self.dispatcher.connect(&target)) {
                    Ok(()) => println!("Connected to '{}'.", target),
                    Err(e) => println!("Connect failed: {}", e),
                }
            }
            ConsoleCommand::Gesture(gesture) => {
                self.dispatcher
                    .dispatch(GestureEvent::new(gesture, EventSource::Manual));
            }
            ConsoleCommand::Status => match self.runtime.block_on(self.dispatcher.state()) {
                Ok(state) => match self.telemetry.altitude() {
                    Some(alt) => println!("Vehicle is {} at {:.1} m.", state, alt),
                    None => println!("Vehicle is {} (no altitude yet).", state),
                },
                Err(e) => println!("Could not query state: {}", e),
            },
            ConsoleCommand::Quit => {
                println!("Shutting down...");
                self.bus.shutdown();
                return false;
            }
            ConsoleCommand::Unknown(word) => {
                println!("Unknown command '{}'. Type 'help'.", word);
            }
        }
        true
    }
}
