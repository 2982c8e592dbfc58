pub mod config;
pub mod net;
pub mod observer;
pub mod options;
pub mod simulation;

pub use net::{Marking, NetDefinition, StepOutcome};
pub use observer::{FileObserver, LogObserver, StateEvent, StateObserver};
pub use simulation::{SimError, Simulation};
