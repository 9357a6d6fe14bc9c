//! MiWallet Engine - daily task runs and membership exchange

pub mod context;
pub mod exchange;
pub mod orchestrator;
pub mod pacing;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use context::{RunContext, RunLog};
pub use orchestrator::{BatchSummary, Orchestrator};
pub use pacing::{InstantPacer, JitterPacer, Pacer, Pause};
