//! Daily task steps: ledger read, new-user bonus, browse rounds

mod bonus;
mod browse;
mod ledger;

pub use bonus::*;
pub use browse::*;
pub use ledger::*;
