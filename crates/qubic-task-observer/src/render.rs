/*
[INPUT]:  TaskSnapshot, AuditLog, ObservationView
[OUTPUT]: Styled terminal lines
[POS]:    Presentation layer - console output for the CLI
[UPDATE]: When adding displayed fields or changing status colors
*/

use console::{StyledObject, style};
use qubic_task_adapter::{AuditEntry, AuditLog, StepStatus, TaskSnapshot, TaskStatus};

use crate::view::{ErrorSource, ObservationView};

const ORANGE: u8 = 208;

pub fn status_label(status: &TaskStatus) -> StyledObject<String> {
    let label = style(status.as_str().to_string());
    match status {
        TaskStatus::Pending => label.yellow(),
        TaskStatus::Executing => label.blue(),
        TaskStatus::WaitingApproval => label.color256(ORANGE).bold(),
        TaskStatus::Approved | TaskStatus::Completed => label.green(),
        TaskStatus::Rejected | TaskStatus::Failed => label.red(),
        TaskStatus::Unknown(_) => label.dim(),
    }
}

fn step_status_label(status: &StepStatus) -> StyledObject<String> {
    let label = style(status.as_str().to_string());
    match status {
        StepStatus::Success => label.green(),
        StepStatus::Failed => label.red(),
        StepStatus::Other(_) => label.dim(),
    }
}

pub fn render_task(task: &TaskSnapshot) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} [{}]",
        style("Task").bold(),
        style(&task.task_id).cyan(),
        status_label(&task.status)
    )];

    if let Some(task_type) = &task.task_type {
        lines.push(format!("  Type: {task_type}"));
    }
    match task.progress() {
        Some((current, total)) => lines.push(format!("  Progress: step {current}/{total}")),
        None => {
            if let Some(current) = task.current_step {
                lines.push(format!("  Progress: step {current}"));
            }
        }
    }
    if task.requires_approval {
        lines.push(format!("  {}", style("Requires approval").color256(ORANGE)));
    }
    if let Some(plan_id) = &task.plan_id {
        lines.push(format!("  Plan: {plan_id}"));
    }
    if let Some(updated_at) = task.updated_at_utc() {
        lines.push(format!("  Updated: {}", updated_at.to_rfc3339()));
    }
    if let Some(message) = &task.message {
        lines.push(format!("  {}", style(message).dim()));
    }
    lines
}

fn render_entry(entry: &AuditEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "  Step {}: {} [{}]",
        entry.step_index,
        entry.step_type,
        step_status_label(&entry.status)
    )];
    if let Some(txid) = &entry.external_txid {
        lines.push(format!(
            "    {} {}",
            style("Qubic TX:").magenta(),
            style(txid).magenta().bold()
        ));
    }
    lines
}

pub fn render_audit(log: &AuditLog) -> Vec<String> {
    let mut lines = vec![style("Audit log").bold().to_string()];
    if log.is_empty() {
        lines.push(format!("  {}", style("No steps recorded yet.").dim()));
        return lines;
    }
    lines.extend(log.logs.iter().flat_map(render_entry));
    if let Some(txid) = &log.latest_txid {
        lines.push(format!(
            "  {} {}",
            style("Latest Qubic TX:").magenta().bold(),
            style(txid).magenta().bold()
        ));
    }
    lines
}

pub fn render_view(view: &ObservationView) -> Vec<String> {
    let mut lines = match &view.task {
        Some(task) => render_task(task),
        None => vec![format!(
            "{} {} {}",
            style("Task").bold(),
            style(&view.task_id).cyan(),
            style("(no status yet)").dim()
        )],
    };
    if let Some(audit) = &view.audit {
        lines.extend(render_audit(audit));
    }
    if let Some(err) = &view.last_error {
        let source = match err.source {
            ErrorSource::Status => "status",
            ErrorSource::Audit => "audit",
        };
        lines.push(format!(
            "{} {}",
            style(format!("Last {source} error:")).red(),
            err.message
        ));
    }
    lines
}
