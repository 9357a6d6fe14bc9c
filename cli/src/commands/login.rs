//! Account login: QR scan or direct token entry

use crate::state::{cancel_on_ctrl_c, AppState};
use anyhow::{bail, Result};
use miwallet_core::{redact, Account};
use miwallet_networking::http::PassportLogin;
use miwallet_networking::QrLoginClient;
use miwallet_persistence::sqlite;
use tracing::info;

pub async fn qr(state: &AppState, alias: &str) -> Result<()> {
    let client = QrLoginClient::new()?;
    let ticket = client.request_qr().await?;

    println!("Open this QR code and scan it with the Mi app:");
    println!("  {}", ticket.qr_url);
    println!("Waiting for confirmation (Ctrl-C to abort)...");

    let cancel = cancel_on_ctrl_c();
    let login = client.poll_login(&ticket, &cancel).await?;
    store_login(state, alias, login).await
}

pub async fn token(state: &AppState, alias: &str, user_id: &str, pass_token: &str) -> Result<()> {
    if user_id.trim().is_empty() || pass_token.trim().is_empty() {
        bail!("user id and pass token must not be blank");
    }

    let login = PassportLogin {
        user_id: user_id.trim().to_string(),
        pass_token: pass_token.trim().to_string(),
        security_token: None,
    };
    store_login(state, alias, login).await
}

/// Keeps the account's exchange configs when refreshing credentials
async fn store_login(state: &AppState, alias: &str, login: PassportLogin) -> Result<()> {
    let pool = state.db.pool();
    let mut account = sqlite::get_account(pool, &state.cipher, alias)
        .await?
        .unwrap_or_else(|| Account::new(alias.trim()));

    account.user_id = Some(login.user_id);
    account.pass_token = Some(login.pass_token);
    account.security_token = login.security_token;

    sqlite::save_account(pool, &state.cipher, &account).await?;
    info!(
        "Saved credentials for '{}' (pass token {})",
        account.alias,
        redact(account.pass_token.as_deref().unwrap_or_default())
    );
    println!("Account '{}' logged in", account.alias);
    Ok(())
}
