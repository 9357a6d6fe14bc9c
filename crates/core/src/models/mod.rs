//! Data models for wallet accounts, tasks, and membership exchange

mod account;
mod ledger;
mod membership;
mod outcome;
mod session;
mod settings;
mod task;
mod wire;

pub use account::*;
pub use ledger::*;
pub use membership::*;
pub use outcome::*;
pub use session::*;
pub use settings::*;
pub use task::*;
pub use wire::*;
