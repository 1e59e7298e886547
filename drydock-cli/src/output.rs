//! Run report rendering — human table and machine JSON.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use drydock_sync::{AclOutcome, ProjectOutcome, RunReport};

#[derive(Tabled)]
struct ReportTableRow {
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

#[derive(Serialize)]
struct ReportJson {
    summary: SummaryJson,
    started_at: String,
    finished_at: String,
    projects: Vec<ProjectJson>,
}

#[derive(Serialize)]
struct SummaryJson {
    projects: usize,
    converged: usize,
    skipped: usize,
    failed: usize,
}

#[derive(Serialize)]
struct ProjectJson {
    project: String,
    status: String,
    detail: String,
}

pub fn print_table(report: &RunReport) {
    println!(
        "drydock v{} | {} projects | {} converged | {} skipped | {} failed",
        env!("CARGO_PKG_VERSION"),
        report.projects.len(),
        report.converged_count(),
        report.skipped_count(),
        report.failed_count(),
    );
    if report.projects.is_empty() {
        println!("No projects declared.");
        return;
    }

    let rows: Vec<ReportTableRow> = report
        .projects
        .iter()
        .map(|p| ReportTableRow {
            project: p.project.to_string(),
            status: status_indicator(&p.outcome),
            detail: outcome_detail(&p.outcome),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let failed = report.failed_count();
    if failed > 0 {
        println!(
            "{}",
            format!("{failed} project(s) failed; see the log for details.").yellow()
        );
    }
}

pub fn print_json(report: &RunReport) -> Result<()> {
    let payload = ReportJson {
        summary: SummaryJson {
            projects: report.projects.len(),
            converged: report.converged_count(),
            skipped: report.skipped_count(),
            failed: report.failed_count(),
        },
        started_at: report.started_at.to_rfc3339(),
        finished_at: report.finished_at.to_rfc3339(),
        projects: report
            .projects
            .iter()
            .map(|p| ProjectJson {
                project: p.project.to_string(),
                status: status_key(&p.outcome).to_string(),
                detail: outcome_detail(&p.outcome),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize the run report")?
    );
    Ok(())
}

fn status_key(outcome: &ProjectOutcome) -> &'static str {
    match outcome {
        ProjectOutcome::Converged { .. } => "converged",
        ProjectOutcome::Skipped => "skipped",
        ProjectOutcome::Failed(_) => "failed",
    }
}

fn status_indicator(outcome: &ProjectOutcome) -> String {
    match outcome {
        ProjectOutcome::Converged { .. } => format!("{} CONVERGED", "■".green().bold()),
        ProjectOutcome::Skipped => format!("{} SKIPPED", "■".bright_black().bold()),
        ProjectOutcome::Failed(_) => format!("{} FAILED", "■".red().bold()),
    }
}

fn outcome_detail(outcome: &ProjectOutcome) -> String {
    match outcome {
        ProjectOutcome::Converged { created, acl } => {
            let mut parts = Vec::new();
            if *created {
                parts.push("created".to_string());
            }
            match acl {
                Some(AclOutcome::Applied) => parts.push("policy applied".to_string()),
                Some(AclOutcome::Unchanged) => parts.push("policy unchanged".to_string()),
                Some(AclOutcome::Failed { reason }) => parts.push(format!("policy: {reason}")),
                None => {}
            }
            if parts.is_empty() {
                "up to date".to_string()
            } else {
                parts.join("; ")
            }
        }
        ProjectOutcome::Skipped => "no-gerrit".to_string(),
        ProjectOutcome::Failed(err) => err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
