//! handpilot-core/src/channel/mod.rs
//!
//! Remote gesture ingress: a TCP listener that accepts one detector client
//! at a time and turns each received text token into a `Network` gesture
//! event for the shared dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use handpilot_common::models::{EventSource, Gesture, GestureEvent};
use handpilot_common::Error;

use crate::dispatcher::DispatcherHandle;
use crate::eventbus::{EventBus, PilotEvent};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelConfig {
    pub listen_addr: String,
    /// Upper bound on bytes taken from the socket per read.
    pub read_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5005".to_string(),
            read_buffer: 1024,
        }
    }
}

/// Translates one wire token and feeds it to the dispatcher.
/// Returns `false` (after publishing a diagnostic) for tokens outside the vocabulary.
pub async fn handle_token(token: &str, dispatcher: &DispatcherHandle, bus: &EventBus) -> bool {
    match Gesture::from_wire(token) {
        Some(gesture) => {
            debug!("remote token '{}' => {}", token, gesture);
            dispatcher.dispatch(GestureEvent::new(gesture, EventSource::Network));
            true
        }
        None => {
            debug!("unrecognized remote token '{}'", token);
            bus.publish(PilotEvent::UnrecognizedGesture {
                token: token.to_string(),
                timestamp: Utc::now(),
            })
            .await;
            false
        }
    }
}

/// Resolves once the shutdown flag is set. Never resolves if the bus is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

enum ClientExit {
    Disconnected,
    Shutdown,
}

pub struct RemoteGestureChannel {
    listener: TcpListener,
    dispatcher: DispatcherHandle,
    bus: Arc<EventBus>,
    read_buffer: usize,
}

impl RemoteGestureChannel {
    pub async fn bind(
        config: &ChannelConfig,
        dispatcher: DispatcherHandle,
        bus: Arc<EventBus>,
    ) -> Result<Self, Error> {
        let listener = TcpListener::bind(&config.listen_addr).await.map_err(|e| {
            Error::Channel(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        Ok(Self {
            listener,
            dispatcher,
            bus,
            read_buffer: config.read_buffer.max(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Accept loop. Errors are reported and the listener keeps accepting;
    /// only the global shutdown flag ends it.
    pub async fn run(self) {
        let mut shutdown_rx = self.bus.shutdown_signal();
        match self.listener.local_addr() {
            Ok(addr) => info!("Remote gesture channel listening on {}", addr),
            Err(_) => info!("Remote gesture channel listening"),
        }

        loop {
            let accepted = tokio::select! {
                res = self.listener.accept() => res,
                _ = wait_for_shutdown(&mut shutdown_rx) => break,
            };

            match accepted {
                Ok((stream, peer)) => {
                    info!("Remote gesture client connected from {}", peer);
                    match self.serve_client(stream, &mut shutdown_rx).await {
                        ClientExit::Disconnected => {
                            info!("Remote gesture client {} disconnected", peer);
                            self.bus
                                .publish(PilotEvent::ChannelError(format!(
                                    "client {} disconnected",
                                    peer
                                )))
                                .await;
                        }
                        ClientExit::Shutdown => break,
                    }
                }
                Err(e) => {
                    warn!("Remote gesture channel accept failed: {}", e);
                    self.bus
                        .publish(PilotEvent::ChannelError(format!("accept failed: {}", e)))
                        .await;
                }
            }
        }

        info!("Remote gesture channel closed");
    }

    async fn serve_client(
        &self,
        mut stream: TcpStream,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> ClientExit {
        let mut buf = vec![0u8; self.read_buffer];
        loop {
            let read = tokio::select! {
                res = stream.read(&mut buf) => res,
                _ = wait_for_shutdown(shutdown_rx) => return ClientExit::Shutdown,
            };

            match read {
                Ok(0) => return ClientExit::Disconnected,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&buf[..n]);
                    for token in text.lines().map(str::trim).filter(|t| !t.is_empty()) {
                        handle_token(token, &self.dispatcher, &self.bus).await;
                    }
                }
                Err(e) => {
                    warn!("Remote gesture channel read failed: {}", e);
                    self.bus
                        .publish(PilotEvent::ChannelError(format!("read failed: {}", e)))
                        .await;
                    return ClientExit::Disconnected;
                }
            }
        }
    }
}
