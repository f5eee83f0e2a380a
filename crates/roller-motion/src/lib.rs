#![warn(missing_docs)]
#![doc = "Position control for a roller driven by a step/direction/enable stepper driver."]
#![doc = ""]
#![doc = "A [`MotionController`] runs on its own thread and converges the current position"]
#![doc = "toward the commanded target by pulsing the step line. A [`CommandInterface`] translates"]
#![doc = "percentages into step targets, and a [`ShutdownCoordinator`] stops motion before exit."]
#![doc = "All three share one [`Blackboard`]."]

pub mod blackboard;
pub mod command;
pub mod controller;
pub mod error;
pub mod output;
pub mod settings;
pub mod shutdown;

pub use blackboard::{Blackboard, Poll, Positions, SharedBoard};
pub use command::{CommandInterface, RollerState, percent_to_steps, steps_to_percent};
pub use controller::{BurstReport, Cycle, MotionController};
pub use error::{CommandError, MotionError};
pub use output::sim::{LineProbe, SimulatedOutput};
#[cfg(feature = "gpio-hardware")]
pub use output::sysfs::SysfsOutput;
pub use output::{DigitalOutput, StepperPins};
pub use settings::{Direction, MotionConfig, StopRule};
pub use shutdown::{ShutdownCoordinator, ShutdownOutcome};
