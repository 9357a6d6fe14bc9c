//! Recorded runs, newest first

use crate::state::AppState;
use anyhow::{bail, Result};

pub async fn list(state: &AppState) -> Result<()> {
    let recorder = state.recorder().await?;
    let outcomes = recorder.list();
    if outcomes.is_empty() {
        println!("No runs recorded");
        return Ok(());
    }

    for outcome in outcomes {
        println!(
            "{}  {}  {:<20} {:>8}  {}",
            &outcome.id[..8.min(outcome.id.len())],
            outcome.started_at.format("%Y-%m-%d %H:%M:%S"),
            outcome.account,
            outcome.duration_label(),
            if outcome.success { "ok" } else { "failed" }
        );
    }
    Ok(())
}

pub async fn show(state: &AppState, id: &str) -> Result<()> {
    let recorder = state.recorder().await?;
    let Some(outcome) = find(&recorder.list(), id) else {
        bail!("no run with id '{}'", id);
    };

    println!("Run {}", outcome.id);
    println!("Account:  {}", outcome.account);
    println!("Started:  {}", outcome.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Duration: {}", outcome.duration_label());
    println!("Result:   {}", if outcome.success { "ok" } else { "failed" });
    if let Some(error) = &outcome.error_message {
        println!("Error:    {}", error);
    }

    if !outcome.exchange_results.is_empty() {
        println!("\nExchange results:");
        for result in &outcome.exchange_results {
            println!("  {} ({})", result.summary_line(), result.phone_number);
        }
    }

    println!("\nLog:");
    for line in &outcome.logs {
        println!("  {}", line);
    }
    Ok(())
}

pub async fn delete(state: &AppState, id: &str) -> Result<()> {
    let recorder = state.recorder().await?;
    let Some(outcome) = find(&recorder.list(), id) else {
        bail!("no run with id '{}'", id);
    };

    recorder.delete(&outcome.id);
    state.save_history(&recorder).await?;
    println!("Deleted run {}", outcome.id);
    Ok(())
}

pub async fn clear(state: &AppState) -> Result<()> {
    let recorder = state.recorder().await?;
    recorder.clear();
    state.save_history(&recorder).await?;
    println!("History cleared");
    Ok(())
}

/// Full id or a unique prefix
fn find(outcomes: &[miwallet_core::RunOutcome], id: &str) -> Option<miwallet_core::RunOutcome> {
    let mut matches = outcomes.iter().filter(|o| o.id.starts_with(id));
    let first = matches.next()?;
    if matches.next().is_some() && first.id != id {
        return None;
    }
    Some(first.clone())
}
