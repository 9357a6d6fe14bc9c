//! One-off new-user campaign bonus

use crate::context::RunContext;
use crate::pacing::Pause;
use miwallet_core::Result;
use miwallet_networking::ActivityApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BonusOutcome {
    /// Not offered to this account (already claimed, or not a new user)
    Unavailable,
    Awarded { user_task_id: String },
    AwardFailed { user_task_id: String, reason: String },
}

/// Only cancellation is an error; everything else is reported in the outcome.
pub async fn claim_new_user_bonus(
    api: &dyn ActivityApi,
    ctx: &mut RunContext,
) -> Result<BonusOutcome> {
    ctx.checkpoint()?;

    let user_task_id = match api.complete_new_user_task().await {
        Ok(Some(id)) => id,
        Ok(None) => {
            ctx.log.info("New-user bonus: not available");
            return Ok(BonusOutcome::Unavailable);
        }
        Err(e) => {
            ctx.log.info(format!("New-user bonus: not available ({})", e));
            return Ok(BonusOutcome::Unavailable);
        }
    };

    ctx.log
        .info(format!("New-user bonus: task {} completed, claiming award", user_task_id));
    ctx.pause(Pause::BonusAward).await?;

    match api.receive_new_user_award(&user_task_id).await {
        Ok(()) => {
            ctx.log.info("New-user bonus: award claimed");
            Ok(BonusOutcome::Awarded { user_task_id })
        }
        Err(e) => {
            ctx.log.warn(format!("New-user bonus: award failed: {}", e));
            Ok(BonusOutcome::AwardFailed {
                user_task_id,
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::InstantPacer;
    use crate::testing::FakeApi;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_unavailable_bonus_is_not_an_error() {
        let api = FakeApi::new();
        let mut ctx = RunContext::new(Arc::new(InstantPacer::default()), CancellationToken::new());

        let outcome = claim_new_user_bonus(&api, &mut ctx).await.unwrap();
        assert_eq!(outcome, BonusOutcome::Unavailable);
        assert_eq!(api.count("receive_new_user_award"), 0);
    }

    #[tokio::test]
    async fn test_award_waits_then_claims() {
        let api = FakeApi::new();
        api.state().new_user_task = Some("ut-1".into());
        let pacer = Arc::new(InstantPacer::default());
        let mut ctx = RunContext::new(pacer.clone(), CancellationToken::new());

        let outcome = claim_new_user_bonus(&api, &mut ctx).await.unwrap();
        assert_eq!(
            outcome,
            BonusOutcome::Awarded {
                user_task_id: "ut-1".into()
            }
        );
        assert_eq!(pacer.requested(), vec![Pause::BonusAward]);
        assert_eq!(api.count("receive_new_user_award:ut-1"), 1);
    }

    #[tokio::test]
    async fn test_award_failure_is_logged_only() {
        let api = FakeApi::new();
        {
            let mut state = api.state();
            state.new_user_task = Some("ut-2".into());
            state.new_user_award_fails = true;
        }
        let mut ctx = RunContext::new(Arc::new(InstantPacer::default()), CancellationToken::new());

        let outcome = claim_new_user_bonus(&api, &mut ctx).await.unwrap();
        assert!(matches!(outcome, BonusOutcome::AwardFailed { .. }));
        assert!(ctx.log.lines().iter().any(|l| l.contains("award failed")));
    }
}
