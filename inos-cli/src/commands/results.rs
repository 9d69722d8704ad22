//! Stored result commands.

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::{Confirm, theme::ColorfulTheme};
use inos_core::Orchestrator;
use tracing::info;

/// Reset arguments.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Table cell for a stored outcome.
pub fn result_cell(passed: Option<bool>) -> Cell {
    match passed {
        Some(true) => Cell::new("passed").fg(Color::Green),
        Some(false) => Cell::new("failed").fg(Color::Red),
        None => Cell::new("-"),
    }
}

/// Show stored results for every enabled assessment.
pub async fn show(orchestrator: &Orchestrator) -> Result<()> {
    let passed = orchestrator.load_results().await?;
    if passed.is_empty() {
        println!("No stored results.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Assessment").fg(Color::Cyan),
        Cell::new("Result").fg(Color::Cyan),
    ]);
    for assessment in orchestrator.enabled_assessments() {
        table.add_row(vec![
            Cell::new(assessment.title()),
            result_cell(passed.get(assessment)),
        ]);
    }

    println!("{table}");
    println!(
        "{} of {} recorded assessments passed",
        passed.passed_count(),
        passed.len()
    );
    Ok(())
}

/// Forget stored results.
pub async fn reset(args: ResetArgs, orchestrator: &Orchestrator) -> Result<()> {
    if !args.yes {
        let confirmed = tokio::task::spawn_blocking(|| {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Forget every stored result?")
                .default(false)
                .interact()
        })
        .await??;
        if !confirmed {
            return Ok(());
        }
    }

    orchestrator.reset_results().await?;
    info!("Stored results cleared");
    println!("Stored results cleared.");
    Ok(())
}
