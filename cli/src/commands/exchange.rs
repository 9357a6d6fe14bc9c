//! Exchange config editing

use crate::state::AppState;
use anyhow::{bail, Result};
use miwallet_core::ExchangeConfig;
use miwallet_persistence::sqlite;

pub async fn add(state: &AppState, alias: &str, membership_type: &str, phone: &str) -> Result<()> {
    let config = ExchangeConfig::new(membership_type, phone);
    if config.membership_type.is_empty() || config.phone_number.is_empty() {
        bail!("membership type and phone must not be blank");
    }

    sqlite::save_exchange_config(state.db.pool(), alias, &config).await?;
    println!(
        "'{}' will redeem '{}' for {}",
        alias, config.membership_type, config.phone_number
    );
    Ok(())
}

pub async fn remove(state: &AppState, alias: &str, membership_type: &str) -> Result<()> {
    if !sqlite::delete_exchange_config(state.db.pool(), alias, membership_type.trim()).await? {
        bail!("'{}' has no exchange for '{}'", alias, membership_type);
    }
    println!("Removed '{}' from '{}'", membership_type.trim(), alias);
    Ok(())
}

pub async fn list(state: &AppState, alias: Option<&str>) -> Result<()> {
    let accounts = sqlite::list_accounts(state.db.pool(), &state.cipher).await?;

    for account in accounts
        .iter()
        .filter(|a| alias.map_or(true, |wanted| a.alias == wanted))
    {
        println!("{}:", account.alias);
        if account.exchange_configs.is_empty() {
            println!("  (none)");
        }
        for config in &account.exchange_configs {
            println!("  {} -> {}", config.membership_type, config.phone_number);
        }
    }
    Ok(())
}
