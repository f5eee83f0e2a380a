mod http_api;   // axum routes for the command interface
mod settings;   // `config/default.toml` + ROLLER_* environment overrides
mod signals;    // SIGINT / SIGTERM listener

use roller_motion::{
    Blackboard, CommandInterface, DigitalOutput, MotionConfig, MotionController, MotionError,
    SharedBoard, ShutdownCoordinator, ShutdownOutcome, SimulatedOutput, StepperPins,
};
#[cfg(feature = "gpio-hardware")]
use roller_motion::SysfsOutput;
use settings::{OutputBackend, PinSettings};
use signals::TerminationSignals;

use std::sync::Arc;
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

type ControllerResult = Result<(), MotionError>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Roller stepper service starting.");

    let settings = settings::load_settings()?;
    let motion = settings.motion_config()?;
    let mut signals = TerminationSignals::register()?;

    let board: SharedBoard = Arc::new(Blackboard::new());
    let (controller_tx, mut controller_rx) = oneshot::channel::<ControllerResult>();
    spawn_controller(&settings.pins, motion, Arc::clone(&board), controller_tx)?;

    let command = Arc::new(CommandInterface::new(Arc::clone(&board), motion.steps_per_percent()));
    let listener = TcpListener::bind(settings.server.addr()).await?;
    info!(addr = %listener.local_addr()?, "HTTP command interface listening.");
    let mut server = tokio::spawn(async move { axum::serve(listener, http_api::router(command)).await });

    tokio::select! {
        signal = signals.recv() => {
            info!(signal, "Termination signal received, stopping motion.");
        }
        result = &mut controller_rx => {
            server.abort();
            match result {
                Ok(Err(e)) => error!("Motion controller failed: {}", e),
                Ok(Ok(())) => error!("Motion controller exited without a stop request."),
                Err(_) => error!("Motion controller thread panicked."),
            }
            std::process::exit(1);
        }
        result = &mut server => {
            anyhow::bail!("HTTP server stopped unexpectedly: {:?}", result);
        }
    }
    server.abort();

    let coordinator = ShutdownCoordinator::new(board, settings.shutdown.timeout());
    let outcome = tokio::task::spawn_blocking(move || coordinator.stop_and_wait()).await?;
    match outcome {
        ShutdownOutcome::Idle { position, waited } => {
            info!(position, ?waited, "Caught interrupt, safely exiting...");
            Ok(())
        }
        ShutdownOutcome::TimedOut { current, target } => {
            error!(current, target, "Motion did not stop in time, forcing exit.");
            std::process::exit(1);
        }
    }
}

/// Open the configured output backend and start the controller on its own
/// thread. Backend failures surface here, before any motion.
fn spawn_controller(
    pins: &PinSettings,
    config: MotionConfig,
    board: SharedBoard,
    done: oneshot::Sender<ControllerResult>,
) -> anyhow::Result<()> {
    info!(backend = ?pins.backend, enable = pins.enable, direction = pins.direction, step = pins.step, "Opening stepper outputs.");
    match pins.backend {
        OutputBackend::Simulated => {
            let outputs = StepperPins::new(
                SimulatedOutput::new("enable", pins.enable),
                SimulatedOutput::new("direction", pins.direction),
                SimulatedOutput::new("step", pins.step),
            )?;
            start(MotionController::new(outputs, config, board), done)
        }
        #[cfg(feature = "gpio-hardware")]
        OutputBackend::Sysfs => {
            let outputs = StepperPins::new(
                SysfsOutput::open(pins.enable)?,
                SysfsOutput::open(pins.direction)?,
                SysfsOutput::open(pins.step)?,
            )?;
            start(MotionController::new(outputs, config, board), done)
        }
        #[cfg(not(feature = "gpio-hardware"))]
        OutputBackend::Sysfs => {
            anyhow::bail!("sysfs backend requested but this build lacks the `gpio-hardware` feature")
        }
    }
}

fn start<P>(controller: MotionController<P>, done: oneshot::Sender<ControllerResult>) -> anyhow::Result<()>
where
    P: DigitalOutput + Send + 'static,
    P::Error: Into<MotionError>,
{
    std::thread::Builder::new()
        .name("stepperctl".into())
        .spawn(move || {
            let _ = done.send(controller.run());
        })?;
    Ok(())
}
