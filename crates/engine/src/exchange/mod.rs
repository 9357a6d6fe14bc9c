//! Membership catalog, matching, and redemption

mod catalog;
mod executor;
mod matcher;

pub use catalog::*;
pub use executor::*;
pub use matcher::*;
