//! MiWallet Networking - passport handshake, activity API client, QR login, and push notifications

pub mod api;
pub mod http;

pub use api::{ActivityApi, HttpConnector, SessionConnector};
pub use http::{acquire_session, QrLoginClient, WalletClient};
