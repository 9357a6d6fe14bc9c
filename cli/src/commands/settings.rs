use crate::state::AppState;
use anyhow::Result;
use miwallet_core::redact;
use miwallet_persistence::sqlite;

/// Fields left as `None` keep their stored value
pub struct SettingsUpdate {
    pub license_key: Option<String>,
    pub notification_token: Option<String>,
    pub auto_run: Option<bool>,
    pub license_endpoint: Option<String>,
}

pub async fn show(state: &AppState) -> Result<()> {
    let settings = sqlite::load_settings(state.db.pool()).await?;

    let shown = |value: &str| {
        if value.trim().is_empty() {
            "(not set)".to_string()
        } else {
            redact(value)
        }
    };

    println!("License key:        {}", shown(&settings.license_key));
    println!("Notification token: {}", shown(&settings.notification_token));
    println!("Auto run:           {}", settings.auto_run_enabled);
    println!(
        "License endpoint:   {}",
        settings.license_endpoint.as_deref().unwrap_or("(not set)")
    );
    println!("Data directory:     {}", state.data_dir.display());
    Ok(())
}

pub async fn set(state: &AppState, update: SettingsUpdate) -> Result<()> {
    let pool = state.db.pool();
    let mut settings = sqlite::load_settings(pool).await?;

    if let Some(key) = update.license_key {
        settings.license_key = key.trim().to_string();
    }
    if let Some(token) = update.notification_token {
        settings.notification_token = token.trim().to_string();
    }
    if let Some(auto_run) = update.auto_run {
        settings.auto_run_enabled = auto_run;
    }
    if let Some(endpoint) = update.license_endpoint {
        let endpoint = endpoint.trim();
        settings.license_endpoint = (!endpoint.is_empty()).then(|| endpoint.to_string());
    }

    sqlite::save_settings(pool, &settings).await?;
    println!("Settings saved");
    Ok(())
}
