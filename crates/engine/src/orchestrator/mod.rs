//! Runs the daily-task flow and the exchange flow over accounts
//!
//! Accounts run strictly one after another with a fixed pause in between.
//! Every run ends in a `RunOutcome` handed to the shared `RunRecorder`,
//! including failed and cancelled ones.

mod summary;

pub use summary::*;

use crate::context::RunContext;
use crate::exchange::{
    check_balance, ensure_in_stock, exchange_membership, fetch_catalog, match_membership, Catalog,
    CatalogSource,
};
use crate::pacing::{self, Pacer, Pause};
use crate::tasks::{claim_new_user_bonus, log_ledger, read_ledger, run_browse_pipeline, BonusOutcome};
use chrono::Local;
use miwallet_core::{
    Account, AppSettings, CurrencyDays, Error, ExchangeConfig, ExchangeResult, Result, RunOutcome,
    DAILY_QUOTA,
};
use miwallet_networking::{ActivityApi, SessionConnector};
use miwallet_persistence::RunRecorder;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Account label used for the single outcome of an exchange batch
pub const EXCHANGE_RUN_LABEL: &str = "Membership exchange";

pub struct Orchestrator {
    connector: Arc<dyn SessionConnector>,
    pacer: Arc<dyn Pacer>,
    recorder: Arc<RunRecorder>,
}

impl Orchestrator {
    pub fn new(
        connector: Arc<dyn SessionConnector>,
        pacer: Arc<dyn Pacer>,
        recorder: Arc<RunRecorder>,
    ) -> Self {
        Self {
            connector,
            pacer,
            recorder,
        }
    }

    pub fn recorder(&self) -> &Arc<RunRecorder> {
        &self.recorder
    }

    /// Count down `seconds`, calling `on_tick` with the seconds left before each tick
    pub async fn countdown(
        &self,
        seconds: u64,
        cancel: &CancellationToken,
        mut on_tick: impl FnMut(u64),
    ) -> Result<()> {
        for remaining in (1..=seconds).rev() {
            on_tick(remaining);
            pacing::wait(self.pacer.as_ref(), Pause::CountdownTick, cancel).await?;
        }
        Ok(())
    }

    // ─── Daily tasks ─────────────────────────────────────────────────

    /// Daily tasks for every account. Fails only when no license key is set.
    pub async fn run_all_tasks(
        &self,
        accounts: &[Account],
        settings: &AppSettings,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        settings.ensure_license_present()?;
        info!("Running daily tasks for {} account(s)", accounts.len());

        let mut outcomes = Vec::with_capacity(accounts.len());
        let mut cancelled = false;

        for (index, account) in accounts.iter().enumerate() {
            if index > 0 && self.between_accounts(cancel).await.is_err() {
                cancelled = true;
                break;
            }

            let outcome = self.run_tasks_for_account(account, cancel).await;
            let stop = cancel.is_cancelled();
            outcomes.push(outcome);
            if stop {
                cancelled = true;
                break;
            }
        }

        Ok(BatchSummary::for_tasks(outcomes, accounts.len(), cancelled))
    }

    /// Session → ledger → quota check → bonus → browse rounds → final ledger
    #[instrument(skip(self, account, cancel), fields(account = %account.alias))]
    pub async fn run_tasks_for_account(
        &self,
        account: &Account,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let started_at = Local::now();
        let mut ctx = RunContext::new(self.pacer.clone(), cancel.clone());

        let result = self.task_flow(account, &mut ctx).await;
        let outcome = finish(RunOutcome::new(&account.alias, started_at), ctx, result);

        self.recorder.record(outcome.clone());
        outcome
    }

    async fn task_flow(&self, account: &Account, ctx: &mut RunContext) -> Result<()> {
        ctx.checkpoint()?;
        ctx.log.info(format!("Starting daily tasks for '{}'", account.alias));

        let api = self.connector.connect(account).await?;
        ctx.log.info("Session established");
        ctx.checkpoint()?;

        let ledger = read_ledger(api.as_ref(), Local::now().date_naive()).await?;
        log_ledger(&mut ctx.log, &ledger);

        if ledger.quota_exhausted() {
            ctx.log.info(format!(
                "Daily quota reached ({}/{}), nothing to do",
                ledger.today_events.len(),
                DAILY_QUOTA
            ));
            return Ok(());
        }

        if let BonusOutcome::Awarded { .. } = claim_new_user_bonus(api.as_ref(), ctx).await? {
            ctx.log.info("New-user bonus added to the balance");
        }

        let report = run_browse_pipeline(api.as_ref(), ctx).await?;
        ctx.log
            .info(format!("Browse rounds finished: {} award(s) claimed", report.awarded()));

        ctx.checkpoint()?;
        match read_ledger(api.as_ref(), Local::now().date_naive()).await {
            Ok(ledger) => {
                ctx.log.info("Final balance:");
                log_ledger(&mut ctx.log, &ledger);
            }
            Err(e) => ctx.log.warn(format!("Final balance unavailable: {}", e)),
        }

        match report.fatal_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ─── Membership exchange ─────────────────────────────────────────

    /// Exchange flow for every account with at least one config, recorded
    /// as one outcome. The outcome fails when configs ran and none of them
    /// redeemed. Returns an error only when no license key is set.
    pub async fn run_all_exchanges(
        &self,
        accounts: &[Account],
        settings: &AppSettings,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        settings.ensure_license_present()?;
        info!("Running membership exchange for {} account(s)", accounts.len());

        let started_at = Local::now();
        let mut ctx = RunContext::new(self.pacer.clone(), cancel.clone());
        let mut results = Vec::new();
        let mut first_error = None;
        let mut cancelled = false;

        ctx.log.info("Membership exchange started");

        let (configured, unconfigured): (Vec<&Account>, Vec<&Account>) = accounts
            .iter()
            .partition(|a| !a.exchange_configs.is_empty());
        for account in unconfigured {
            ctx.log
                .info(format!("'{}': no exchange configured, skipping", account.alias));
        }

        for (index, account) in configured.into_iter().enumerate() {
            if index > 0 && ctx.pause(Pause::BetweenAccounts).await.is_err() {
                cancelled = true;
                break;
            }

            match self.exchange_flow(account, &mut ctx, &mut results).await {
                Ok(()) => {}
                Err(Error::Cancelled) => {
                    cancelled = true;
                    break;
                }
                Err(e) => {
                    ctx.log.warn(format!("'{}': {}", account.alias, e));
                    first_error.get_or_insert(e);
                }
            }
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        ctx.log.info(format!(
            "Exchange finished: {} succeeded, {} failed",
            succeeded,
            results.len() - succeeded
        ));

        let result = match first_error {
            _ if cancelled => Err(Error::Cancelled),
            Some(e) => Err(e),
            None if !results.is_empty() && succeeded == 0 => Err(Error::NothingExchanged),
            None => Ok(()),
        };

        let mut outcome = finish(RunOutcome::new(EXCHANGE_RUN_LABEL, started_at), ctx, result);
        outcome.exchange_results = results;
        self.recorder.record(outcome.clone());

        Ok(BatchSummary::for_exchange(outcome, cancelled))
    }

    /// Session → balance → catalog → each config in turn. Results are pushed
    /// as they happen so a cancellation keeps what already ran.
    async fn exchange_flow(
        &self,
        account: &Account,
        ctx: &mut RunContext,
        results: &mut Vec<ExchangeResult>,
    ) -> Result<()> {
        ctx.log.info(format!("Processing '{}'", account.alias));
        let api = self.connector.connect(account).await?;
        ctx.checkpoint()?;

        let mut balance = match api.gold_rich_sum().await {
            Ok(balance) => balance,
            Err(e) => {
                ctx.log.warn(format!("Balance unavailable, assuming 0: {}", e));
                CurrencyDays::ZERO
            }
        };
        ctx.log.info(format!("Balance: {} days", balance));

        let catalog = fetch_catalog(api.as_ref()).await;
        ctx.log.info(format!(
            "Catalog: {} membership(s){}",
            catalog.entries.len(),
            if catalog.source == CatalogSource::Fallback {
                " (built-in list)"
            } else {
                ""
            }
        ));

        for config in &account.exchange_configs {
            ctx.checkpoint()?;

            let (result, spent) = exchange_one(api.as_ref(), &catalog, balance, config, ctx).await;
            if result.success {
                ctx.log.info(result.summary_line());
            } else {
                ctx.log.warn(result.summary_line());
            }

            let succeeded = result.success;
            results.push(result);

            if succeeded {
                balance = CurrencyDays::from_points((balance.points() - spent.points()).max(0));
                ctx.pause(Pause::ExchangeCooldown).await?;
            }
        }

        Ok(())
    }

    async fn between_accounts(&self, cancel: &CancellationToken) -> Result<()> {
        pacing::wait(self.pacer.as_ref(), Pause::BetweenAccounts, cancel).await
    }
}

/// Match → balance → stock → redeem. Returns the result and the cost charged.
async fn exchange_one(
    api: &dyn ActivityApi,
    catalog: &Catalog,
    balance: CurrencyDays,
    config: &ExchangeConfig,
    ctx: &mut RunContext,
) -> (ExchangeResult, CurrencyDays) {
    let requested = config.membership_type.as_str();
    let phone = config.phone_number.as_str();
    ctx.log.info(format!("Looking for '{}' (phone {})", requested, phone));

    let Some(entry) = match_membership(requested, &catalog.entries) else {
        let err = Error::NoMatchFound(requested.to_string());
        return (ExchangeResult::failed(requested, phone, err.to_string()), CurrencyDays::ZERO);
    };
    ctx.log.info(format!("Matched {} ({})", entry.name, entry.brand));

    let precheck = check_balance(&entry, balance).and_then(|_| ensure_in_stock(&entry));
    if let Err(e) = precheck {
        return (ExchangeResult::failed(requested, phone, e.to_string()), CurrencyDays::ZERO);
    }

    let result = exchange_membership(api, &entry, phone, requested).await;
    (result, entry.cost)
}

fn finish(mut outcome: RunOutcome, mut ctx: RunContext, result: Result<()>) -> RunOutcome {
    match result {
        Ok(()) => {
            ctx.log.info("Run finished");
            outcome.success = true;
        }
        Err(e) => {
            warn!("Run for '{}' failed: {}", outcome.account, e);
            ctx.log.warn(format!("Run failed: {}", e));
            outcome.error_message = Some(e.to_string());
        }
    }
    outcome.logs = ctx.into_log().into_lines();
    outcome.finished_at = Local::now();
    outcome
}
