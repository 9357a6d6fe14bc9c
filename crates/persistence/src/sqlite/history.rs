//! Run history persisted between invocations

use miwallet_core::{Error, Result, RunOutcome};
use sqlx::SqlitePool;
use tracing::warn;

/// Oldest first
pub async fn load_history(pool: &SqlitePool) -> Result<Vec<RunOutcome>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT payload FROM run_history ORDER BY started_at ASC")
            .fetch_all(pool)
            .await
            .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows
        .into_iter()
        .filter_map(|(payload,)| match serde_json::from_str(&payload) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Dropping unreadable history entry: {}", e);
                None
            }
        })
        .collect())
}

/// Replace the stored history with `outcomes`
pub async fn replace_history(pool: &SqlitePool, outcomes: &[RunOutcome]) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    sqlx::query("DELETE FROM run_history")
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    for outcome in outcomes {
        sqlx::query(
            "INSERT INTO run_history (id, account, started_at, payload) VALUES (?, ?, ?, ?)",
        )
        .bind(&outcome.id)
        .bind(&outcome.account)
        .bind(outcome.started_at.to_rfc3339())
        .bind(serde_json::to_string(outcome)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    Ok(())
}
