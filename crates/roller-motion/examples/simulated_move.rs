//! Drive a simulated roller to 25% and back to 0%, then stop it.
//!
//! Run with `RUST_LOG=debug cargo run -p roller-motion --example simulated_move`.

use std::{sync::Arc, thread, time::Duration};

use roller_motion::{
    Blackboard, CommandInterface, MotionConfig, MotionController, SharedBoard, ShutdownCoordinator,
    ShutdownOutcome, SimulatedOutput, StepperPins,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = MotionConfig::new(4_000, 19.2)?
        .with_settle_delay(Duration::from_millis(100))
        .with_poll_interval(Duration::from_millis(100));
    let board: SharedBoard = Arc::new(Blackboard::new());

    let step = SimulatedOutput::new("step", 16);
    let step_probe = step.probe();
    let pins = StepperPins::new(
        SimulatedOutput::new("enable", 25),
        SimulatedOutput::new("direction", 12),
        step,
    )?;
    let controller = MotionController::new(pins, config, Arc::clone(&board));
    let handle = thread::Builder::new()
        .name("stepperctl".into())
        .spawn(move || controller.run())?;

    let command = CommandInterface::new(Arc::clone(&board), config.steps_per_percent());
    for percent in [25, 0] {
        command.set_target(percent)?;
        while command.get_state().state != 0 {
            println!("{:?}", command.get_state());
            thread::sleep(Duration::from_millis(50));
        }
    }

    let coordinator = ShutdownCoordinator::new(Arc::clone(&board), ShutdownCoordinator::DEFAULT_TIMEOUT);
    match coordinator.stop_and_wait() {
        ShutdownOutcome::Idle { position, waited } => {
            println!("stopped at {} after {:?}, {} pulses", position, waited, step_probe.rising_edges())
        }
        ShutdownOutcome::TimedOut { current, target } => {
            println!("timed out at {} (target {})", current, target)
        }
    }
    handle.join().map_err(|_| "controller thread panicked")??;
    Ok(())
}
