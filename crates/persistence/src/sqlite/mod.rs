//! SQLite database management

mod accounts;
mod connection;
mod history;
mod settings;

pub use accounts::*;
pub use connection::{Database, DATABASE_FILE};
pub use history::*;
pub use settings::*;
