use crate::state::AppState;
use anyhow::{bail, Result};
use miwallet_persistence::sqlite;

pub async fn list(state: &AppState) -> Result<()> {
    let accounts = sqlite::list_accounts(state.db.pool(), &state.cipher).await?;
    if accounts.is_empty() {
        println!("No accounts. Add one with `miwallet login qr <alias>`.");
        return Ok(());
    }

    for account in accounts {
        let status = if account.is_logged_in() {
            "logged in"
        } else {
            "logged out"
        };
        println!(
            "{:<16} user {:<12} {:<10} {} exchange(s)",
            account.alias,
            account.user_id.as_deref().unwrap_or("-"),
            status,
            account.exchange_configs.len()
        );
    }
    Ok(())
}

pub async fn remove(state: &AppState, alias: &str) -> Result<()> {
    if !sqlite::delete_account(state.db.pool(), alias).await? {
        bail!("no account named '{}'", alias);
    }
    println!("Removed '{}'", alias);
    Ok(())
}
