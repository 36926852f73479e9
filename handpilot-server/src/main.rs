use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tokio::runtime::Handle;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use handpilot_core::channel::RemoteGestureChannel;
use handpilot_core::dispatcher::Dispatcher;
use handpilot_core::eventbus::{EventBus, PilotEvent};
use handpilot_core::platforms::SimulatedVehicle;
use handpilot_core::sources::ImageSequenceSource;
use handpilot_core::tasks::{spawn_event_logger, spawn_frame_worker};
use handpilot_core::telemetry::TelemetryTracker;
use handpilot_core::vision::Classifier;
use handpilot_core::PilotConfig;

mod console;
use console::ManualConsole;

#[derive(Parser, Debug, Clone)]
#[command(name = "handpilot")]
#[command(author, version, about = "HandPilot - fly a drone with hand gestures")]
struct Args {
    /// Address for the remote gesture channel (overrides the config file)
    #[arg(long)]
    listen_addr: Option<String>,

    /// Directory of image files replayed as the camera feed
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Restart the image sequence when it runs out
    #[arg(long, default_value = "false")]
    loop_frames: bool,

    /// Pause between replayed frames, in milliseconds
    #[arg(long, default_value_t = 33)]
    frame_interval_ms: u64,

    /// Connection target handed to the vehicle link
    #[arg(long, default_value = "simulacion")]
    vehicle_target: String,

    /// Optional JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read manual override commands from stdin
    #[arg(long, short = 'c', default_value = "false")]
    console: bool,

    /// How long the simulated vehicle takes to finish each command
    #[arg(long, default_value_t = 500)]
    sim_delay_ms: u64,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("handpilot_core=info,handpilot_server=info"));
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).context("failed to set global subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;
    let args = Args::parse();
    info!(
        "HandPilot starting. frames_dir={:?}, console={}, target={}",
        args.frames_dir, args.console, args.vehicle_target
    );

    if let Err(e) = run(args).await {
        error!("HandPilot error: {:?}", e);
        return Err(e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<PilotConfig> {
    let mut config = match &args.config {
        Some(path) => PilotConfig::load(path)?,
        None => PilotConfig::default(),
    };
    if let Some(addr) = &args.listen_addr {
        config.channel.listen_addr = addr.clone();
    }
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    // 1) Event bus and its log sink
    let event_bus = Arc::new(EventBus::new());
    let logger_handle = spawn_event_logger(&event_bus, 1024);

    // 2) Vehicle link and dispatcher
    let vehicle = Arc::new(SimulatedVehicle::new(1, Duration::from_millis(args.sim_delay_ms)));
    let telemetry = TelemetryTracker::new(event_bus.clone());
    let dispatcher = Dispatcher::new(vehicle, event_bus.clone(), config.dispatcher.clone())
        .with_telemetry(telemetry.clone())
        .spawn();
    dispatcher
        .connect(&args.vehicle_target)
        .await
        .with_context(|| format!("connecting to '{}'", args.vehicle_target))?;

    // 3) Remote gesture channel
    let channel = RemoteGestureChannel::bind(&config.channel, dispatcher.clone(), event_bus.clone())
        .await?;
    let channel_handle = channel.spawn();

    // 4) Camera pipeline
    let frame_handle = match &args.frames_dir {
        Some(dir) => {
            let source = ImageSequenceSource::open(dir, args.loop_frames)?;
            Some(spawn_frame_worker(
                source,
                Classifier::new(config.classifier.clone()),
                config.stabilizer.clone(),
                dispatcher.clone(),
                event_bus.clone(),
                Duration::from_millis(args.frame_interval_ms),
            ))
        }
        None => {
            info!("No --frames-dir given; camera pipeline disabled.");
            None
        }
    };

    // 5) Manual console
    if args.console {
        ManualConsole::new(
            dispatcher.clone(),
            event_bus.clone(),
            telemetry.clone(),
            args.vehicle_target.clone(),
            Handle::current(),
        )
        .spawn();
    }

    // 6) Ctrl-C => shutdown
    let eb_clone = event_bus.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        info!("Ctrl-C detected; shutting down...");
        eb_clone.shutdown();
    });

    event_bus
        .publish(PilotEvent::SystemMessage("HandPilot ready".into()))
        .await;

    let mut shutdown_rx = event_bus.shutdown_signal();
    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("Shutdown signaled; stopping workers.");

    if let Err(e) = channel_handle.await {
        warn!("Remote gesture channel task failed: {:?}", e);
    }
    if let Some(handle) = frame_handle {
        match handle.await {
            Ok(stats) => info!("Camera pipeline processed {} frame(s).", stats.frames),
            Err(e) => warn!("Frame worker failed: {:?}", e),
        }
    }
    dispatcher.shutdown().await?;
    let _ = logger_handle.await;
    Ok(())
}
