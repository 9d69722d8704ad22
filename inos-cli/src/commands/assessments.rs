//! Assessment catalog and device status listing.

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use inos_core::{AppGate, Orchestrator, ProbePattern};

/// List arguments.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Skip the device status summary
    #[arg(long)]
    pub no_status: bool,
}

/// Run list command.
pub async fn run(args: ListArgs, orchestrator: &Orchestrator) -> Result<()> {
    match orchestrator.app_gate() {
        AppGate::Ready => {}
        AppGate::Maintenance => println!("Assessments are under maintenance."),
        AppGate::ForceUpdate => println!("An update is required before running assessments."),
    }

    if !args.no_status {
        let mut status = Table::new();
        status.load_preset(UTF8_FULL_CONDENSED);
        status.set_header(vec![
            Cell::new("Status").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
        for entry in orchestrator.load_status().await {
            status.add_row(vec![Cell::new(entry.kind), Cell::new(entry.value)]);
        }
        println!("{status}");
        println!();
    }

    let passed = orchestrator.load_results().await?;
    let catalog = orchestrator.catalog();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Key").fg(Color::Cyan),
        Cell::new("Assessment").fg(Color::Cyan),
        Cell::new("Probe").fg(Color::Cyan),
        Cell::new("Policy").fg(Color::Cyan),
        Cell::new("Last result").fg(Color::Cyan),
    ]);

    for (index, assessment) in orchestrator.enabled_assessments().into_iter().enumerate() {
        let mut policy = Vec::new();
        if catalog.needs_confirmation(assessment) {
            policy.push("confirm");
        }
        if catalog.is_undelayed(assessment) {
            policy.push("no pause");
        }
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(assessment.key()),
            Cell::new(assessment.title()),
            Cell::new(pattern_label(assessment.pattern())),
            Cell::new(policy.join(", ")),
            super::results::result_cell(passed.get(assessment)),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn pattern_label(pattern: ProbePattern) -> &'static str {
    match pattern {
        ProbePattern::Immediate => "immediate",
        ProbePattern::SingleCallback => "callback",
        ProbePattern::FailureSensitive => "callback (fails on error)",
        ProbePattern::EventTrigger(_) => "system event",
        ProbePattern::Surface(_) => "test screen",
        ProbePattern::CountConfirmation => "count",
    }
}
