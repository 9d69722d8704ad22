//! Single and serial runs.

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use inos_core::{AppGate, Assessment, Orchestrator, RunHandle, RunOutcome};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::harness::console;

/// Run arguments.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Assessment key (e.g. cpu, wifi, mainSpeaker)
    pub assessment: Assessment,
}

/// Run one assessment.
pub async fn run_single(args: RunArgs, orchestrator: Orchestrator) -> Result<()> {
    ensure_ready(&orchestrator)?;
    let orchestrator = Arc::new(orchestrator);
    let handle = orchestrator.run_single(args.assessment);
    let outcome = supervise(&orchestrator, handle).await;
    report(&orchestrator, outcome, &[args.assessment]);
    Ok(())
}

/// Run every enabled assessment in catalog order.
pub async fn run_serial(orchestrator: Orchestrator) -> Result<()> {
    ensure_ready(&orchestrator)?;
    let orchestrator = Arc::new(orchestrator);
    let enabled = orchestrator.enabled_assessments();
    println!("Running {} assessments.", enabled.len());

    let handle = orchestrator.run_serial();
    let outcome = supervise(&orchestrator, handle).await;
    report(&orchestrator, outcome, &enabled);
    Ok(())
}

fn ensure_ready(orchestrator: &Orchestrator) -> Result<()> {
    match orchestrator.app_gate() {
        AppGate::Ready => Ok(()),
        AppGate::Maintenance => bail!("Assessments are under maintenance"),
        AppGate::ForceUpdate => bail!("An update is required before running assessments"),
    }
}

/// Answer prompts on the console until the run ends. Ctrl-C cancels the run.
async fn supervise(orchestrator: &Arc<Orchestrator>, handle: RunHandle) -> RunOutcome {
    let console_token = CancellationToken::new();
    let console = tokio::spawn(console::drive(
        Arc::clone(orchestrator),
        console_token.clone(),
    ));

    let wait = handle.wait();
    tokio::pin!(wait);
    let outcome = tokio::select! {
        outcome = &mut wait => outcome,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, cancelling run");
            orchestrator.cancel();
            wait.await
        }
    };

    console_token.cancel();
    console.abort();
    outcome
}

fn report(orchestrator: &Orchestrator, outcome: RunOutcome, assessments: &[Assessment]) {
    let state = orchestrator.state();
    let recorded = assessments
        .iter()
        .filter(|assessment| state.passed.contains(**assessment))
        .count();
    let passed = assessments
        .iter()
        .filter(|assessment| state.passed.get(**assessment) == Some(true))
        .count();

    println!();
    match outcome {
        RunOutcome::Completed => println!("Finished: {passed} of {recorded} passed."),
        RunOutcome::Declined => println!("Stopped at confirmation: {passed} of {recorded} passed."),
        RunOutcome::Cancelled => println!("Cancelled: {passed} of {recorded} passed."),
    }
    for assessment in assessments {
        if let Some(error) = state.failures.get(assessment) {
            println!("  {}: {}", assessment.title(), error);
        }
    }
}
