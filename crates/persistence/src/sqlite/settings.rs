//! App settings stored as JSON in the settings table

use miwallet_core::{AppSettings, Error, Result};
use sqlx::SqlitePool;

const APP_SETTINGS_KEY: &str = "app_settings";

/// Load app settings; defaults when nothing has been saved yet
pub async fn load_settings(pool: &SqlitePool) -> Result<AppSettings> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(APP_SETTINGS_KEY)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    match row {
        Some((json,)) => Ok(serde_json::from_str(&json)?),
        None => Ok(AppSettings::default()),
    }
}

pub async fn save_settings(pool: &SqlitePool, settings: &AppSettings) -> Result<()> {
    let json = serde_json::to_string(settings)?;

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(APP_SETTINGS_KEY)
        .bind(json)
        .execute(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}
