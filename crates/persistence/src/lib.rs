//! MiWallet Persistence - account store, credential encryption, and run history

pub mod encryption;
pub mod history;
pub mod sqlite;

pub use encryption::{derive_machine_key, device_id, CredentialCipher, SealedSecret};
pub use history::RunRecorder;
pub use sqlite::Database;
