//! Per-run state threaded through every step: pacing, cancellation, and the run log

use crate::pacing::{self, Pacer, Pause};
use miwallet_core::{Error, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Ordered, human-readable progress lines for one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        warn!("{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

pub struct RunContext {
    pacer: Arc<dyn Pacer>,
    cancel: CancellationToken,
    pub log: RunLog,
}

impl RunContext {
    pub fn new(pacer: Arc<dyn Pacer>, cancel: CancellationToken) -> Self {
        Self {
            pacer,
            cancel,
            log: RunLog::default(),
        }
    }

    pub async fn pause(&self, pause: Pause) -> Result<()> {
        pacing::wait(self.pacer.as_ref(), pause, &self.cancel).await
    }

    /// `Cancelled` if the run was cancelled since the last step
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn into_log(self) -> RunLog {
        self.log
    }
}
