//! Daily-task and exchange batches

use crate::state::{cancel_on_ctrl_c, AppState};
use anyhow::Result;
use miwallet_core::{AppSettings, Error};
use miwallet_engine::BatchSummary;
use miwallet_networking::api::{verify_license, Notifier, PushPlusNotifier};
use miwallet_persistence::{device_id, sqlite};
use tracing::{info, warn};

pub async fn daily_tasks(state: &AppState, countdown: u64, scheduled: bool) -> Result<()> {
    let settings = sqlite::load_settings(state.db.pool()).await?;
    if scheduled && !settings.auto_run_enabled {
        info!("Auto run is disabled, nothing to do");
        return Ok(());
    }
    check_license(&settings).await?;

    let accounts = sqlite::list_accounts(state.db.pool(), &state.cipher).await?;
    if accounts.is_empty() {
        println!("No accounts. Add one with `miwallet login qr <alias>`.");
        return Ok(());
    }

    let cancel = cancel_on_ctrl_c();
    let orchestrator = state.orchestrator().await?;

    match orchestrator
        .countdown(countdown, &cancel, |left| println!("Starting in {}s...", left))
        .await
    {
        Err(Error::Cancelled) => {
            println!("Cancelled");
            return Ok(());
        }
        other => other?,
    }

    let summary = orchestrator.run_all_tasks(&accounts, &settings, &cancel).await?;
    state.save_history(orchestrator.recorder()).await?;

    for outcome in &summary.outcomes {
        let status = match &outcome.error_message {
            None => "ok".to_string(),
            Some(e) => format!("failed: {}", e),
        };
        println!("{:<16} {:>8}  {}", outcome.account, outcome.duration_label(), status);
    }
    finish(&settings, &summary).await;
    Ok(())
}

pub async fn exchanges(state: &AppState) -> Result<()> {
    let settings = sqlite::load_settings(state.db.pool()).await?;
    check_license(&settings).await?;

    let accounts = sqlite::list_accounts(state.db.pool(), &state.cipher).await?;
    let cancel = cancel_on_ctrl_c();
    let orchestrator = state.orchestrator().await?;

    let summary = orchestrator
        .run_all_exchanges(&accounts, &settings, &cancel)
        .await?;
    state.save_history(orchestrator.recorder()).await?;

    for result in &summary.exchange_results {
        println!("{}", result.summary_line());
    }
    finish(&settings, &summary).await;
    Ok(())
}

/// Non-blank key, then the remote check when an endpoint is configured
async fn check_license(settings: &AppSettings) -> Result<()> {
    let key = settings.ensure_license_present()?;

    if let Some(endpoint) = settings
        .license_endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        verify_license(endpoint, key, &device_id()?).await?;
        info!("License verified");
    }
    Ok(())
}

async fn finish(settings: &AppSettings, summary: &BatchSummary) {
    println!(
        "\n{} succeeded, {} failed{}",
        summary.succeeded,
        summary.failed,
        if summary.cancelled { " (cancelled)" } else { "" }
    );

    let Some(notifier) = PushPlusNotifier::from_token(&settings.notification_token) else {
        return;
    };
    if let Err(e) = notifier
        .notify(&summary.notification_title(), &summary.notification_body())
        .await
    {
        warn!("Notification failed: {}", e);
    }
}
