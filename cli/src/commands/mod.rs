//! One module per top-level subcommand

pub mod accounts;
pub mod exchange;
pub mod history;
pub mod login;
pub mod run;
pub mod settings;
