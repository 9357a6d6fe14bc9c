//! Handles shared by every command

use anyhow::{Context, Result};
use miwallet_engine::{JitterPacer, Orchestrator};
use miwallet_networking::HttpConnector;
use miwallet_persistence::sqlite::{self, DATABASE_FILE};
use miwallet_persistence::{CredentialCipher, Database, RunRecorder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct AppState {
    pub db: Database,
    pub cipher: CredentialCipher,
    pub data_dir: PathBuf,
}

impl AppState {
    pub async fn open(data_dir: PathBuf) -> Result<Self> {
        let cipher = CredentialCipher::for_this_machine()
            .context("failed to derive the machine encryption key")?;
        debug!("Encryption key derived from machine fingerprint");

        let db_path = data_dir.join(DATABASE_FILE);
        let db = Database::connect(&db_path)
            .await
            .with_context(|| format!("failed to open {}", db_path.display()))?;

        Ok(Self {
            db,
            cipher,
            data_dir,
        })
    }

    /// Recorder seeded with the persisted history
    pub async fn recorder(&self) -> Result<Arc<RunRecorder>> {
        let outcomes = sqlite::load_history(self.db.pool()).await?;
        Ok(Arc::new(RunRecorder::from_outcomes(outcomes)))
    }

    pub async fn save_history(&self, recorder: &RunRecorder) -> Result<()> {
        sqlite::replace_history(self.db.pool(), &recorder.snapshot()).await?;
        Ok(())
    }

    pub async fn orchestrator(&self) -> Result<Orchestrator> {
        Ok(Orchestrator::new(
            Arc::new(HttpConnector),
            Arc::new(JitterPacer),
            self.recorder().await?,
        ))
    }
}

/// Token cancelled on the first Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping after the current step");
            token.cancel();
        }
    });
    cancel
}
