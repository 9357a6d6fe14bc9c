//! Browse-task rounds
//!
//! Each round walks the same state machine from scratch:
//!
//! ```text
//! FetchList -> SelectTask -> Dwell -> Complete --(id)--> Award
//!                                        \--(empty)--> RetryViaGetTask --(id)--> Award
//! ```
//!
//! An empty task list ends the pipeline quietly. A task without a
//! click-tracking id ends it with `MissingTaskIdentifier`. Award failures
//! and empty completions only affect their own round.

use crate::context::RunContext;
use crate::pacing::Pause;
use miwallet_core::{select_browse_task, BrowseTask, Error, Result, TaskInfo};
use miwallet_networking::ActivityApi;

pub const BROWSE_ROUNDS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    Awarded { task: String },
    AwardFailed { task: String, reason: String },
    /// `EmptyCompletionRetryExhausted`: no user task id, even via `getTask`
    CompletionEmpty { task: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStop {
    /// Every round ran
    Completed,
    /// No browse task was offered in this round (1-based)
    NoTasksLeft { round: usize },
    /// The selected task had no click-tracking id
    MissingTaskIdentifier { round: usize, task: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub rounds: Vec<RoundOutcome>,
    pub stop: PipelineStop,
}

impl PipelineReport {
    pub fn awarded(&self) -> usize {
        self.rounds
            .iter()
            .filter(|r| matches!(r, RoundOutcome::Awarded { .. }))
            .count()
    }

    /// The error that aborted the pipeline, if any
    pub fn fatal_error(&self) -> Option<Error> {
        match &self.stop {
            PipelineStop::MissingTaskIdentifier { task, .. } => {
                Some(Error::MissingTaskIdentifier(task.clone()))
            }
            _ => None,
        }
    }
}

enum RoundState {
    FetchList,
    SelectTask(Vec<TaskInfo>),
    Dwell(BrowseTask),
    Complete(BrowseTask),
    RetryViaGetTask(BrowseTask),
    Award {
        task: BrowseTask,
        user_task_id: String,
    },
}

enum RoundEnd {
    Finished(RoundOutcome),
    Stop(PipelineStop),
}

/// Run up to `BROWSE_ROUNDS` rounds. Only cancellation is returned as an error.
pub async fn run_browse_pipeline(
    api: &dyn ActivityApi,
    ctx: &mut RunContext,
) -> Result<PipelineReport> {
    let mut rounds = Vec::with_capacity(BROWSE_ROUNDS);

    for round in 1..=BROWSE_ROUNDS {
        ctx.checkpoint()?;
        ctx.log.info(format!("Browse round {}/{}", round, BROWSE_ROUNDS));

        match run_round(api, ctx, round).await? {
            RoundEnd::Finished(outcome) => rounds.push(outcome),
            RoundEnd::Stop(stop) => return Ok(PipelineReport { rounds, stop }),
        }

        ctx.pause(Pause::StepJitter).await?;
    }

    Ok(PipelineReport {
        rounds,
        stop: PipelineStop::Completed,
    })
}

async fn run_round(api: &dyn ActivityApi, ctx: &mut RunContext, round: usize) -> Result<RoundEnd> {
    let mut state = RoundState::FetchList;

    loop {
        state = match state {
            RoundState::FetchList => match api.task_list().await {
                Ok(tasks) => RoundState::SelectTask(tasks),
                Err(e) => {
                    ctx.log.warn(format!("Task list unavailable: {}", e));
                    return Ok(RoundEnd::Stop(PipelineStop::NoTasksLeft { round }));
                }
            },

            RoundState::SelectTask(tasks) => match select_browse_task(tasks) {
                None => {
                    ctx.log.info("No browse tasks left");
                    return Ok(RoundEnd::Stop(PipelineStop::NoTasksLeft { round }));
                }
                Some(task) if task.click_id.is_none() => {
                    ctx.log
                        .warn(format!("Task '{}' has no click-tracking id, stopping", task.name));
                    return Ok(RoundEnd::Stop(PipelineStop::MissingTaskIdentifier {
                        round,
                        task: task.name,
                    }));
                }
                Some(task) => {
                    ctx.log.info(format!("Selected task '{}'", task.name));
                    RoundState::Dwell(task)
                }
            },

            RoundState::Dwell(task) => {
                ctx.pause(Pause::TaskDwell).await?;
                RoundState::Complete(task)
            }

            RoundState::Complete(task) => {
                let click_id = task.click_id.clone().unwrap_or_default();
                let completed = api
                    .complete_task(&task.task_id, &click_id, &task.brows_click_url_id)
                    .await;
                ctx.pause(Pause::StepJitter).await?;

                match completed {
                    Ok(Some(user_task_id)) => {
                        ctx.log.info(format!("Task completed, user task {}", user_task_id));
                        RoundState::Award { task, user_task_id }
                    }
                    Ok(None) => {
                        ctx.log.info("Completion returned no user task id, asking getTask");
                        RoundState::RetryViaGetTask(task)
                    }
                    Err(e) => {
                        ctx.log.warn(format!("Completion failed ({}), asking getTask", e));
                        RoundState::RetryViaGetTask(task)
                    }
                }
            }

            RoundState::RetryViaGetTask(task) => {
                ctx.pause(Pause::StepJitter).await?;
                match api.get_task(&task.task_code).await {
                    Ok(Some(user_task_id)) => {
                        ctx.log.info(format!("getTask returned user task {}", user_task_id));
                        RoundState::Award { task, user_task_id }
                    }
                    Ok(None) | Err(_) => {
                        ctx.log
                            .warn(format!("{} ('{}')", Error::EmptyCompletionRetryExhausted, task.name));
                        return Ok(RoundEnd::Finished(RoundOutcome::CompletionEmpty {
                            task: task.name,
                        }));
                    }
                }
            }

            RoundState::Award { task, user_task_id } => {
                ctx.pause(Pause::StepJitter).await?;
                let outcome = match api.receive_award(&user_task_id).await {
                    Ok(()) => {
                        ctx.log.info(format!("Award claimed for '{}'", task.name));
                        RoundOutcome::Awarded { task: task.name }
                    }
                    Err(e) => {
                        ctx.log.warn(format!("Award for '{}' failed: {}", task.name, e));
                        RoundOutcome::AwardFailed {
                            task: task.name,
                            reason: e.to_string(),
                        }
                    }
                };
                return Ok(RoundEnd::Finished(outcome));
            }
        };
    }
}
