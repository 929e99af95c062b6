//! Output formatting utilities

use crate::error::CliResult;
use crate::script::Report;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Print a single item as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a scenario report in the requested format
pub fn print_report(report: &Report, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Text => {
            for line in render_report(report) {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

/// Render a report as text lines
pub fn render_report(report: &Report) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.steps.len() + report.proposals.len() + 4);

    for step in &report.steps {
        if step.succeeded() {
            lines.push(format!("✓ [{}] {}: {}", step.step, step.action, step.detail));
        } else {
            lines.push(format!(
                "✗ [{}] {}: {} (expected)",
                step.step,
                step.action,
                step.message.as_deref().unwrap_or_default()
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!("DAO: {}", report.dao));
    lines.push(format!("Treasury balance: {}", report.balance));
    for p in &report.proposals {
        lines.push(format!(
            "  {} \"{}\" {} to {}  up {} down {}  paid {}  passed {}",
            p.id, p.title, p.amount, p.beneficiary, p.tally.up, p.tally.down, p.paid, p.passed
        ));
    }
    lines.push(format!(
        "Payouts: {}  Audit records: {}",
        report.payouts.len(),
        report.audit_records
    ));
    lines
}
