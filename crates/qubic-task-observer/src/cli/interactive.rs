/*
[INPUT]:  Task awaiting approval, user input via terminal
[OUTPUT]: Approve/reject choice with a reason, per-episode prompt bookkeeping
[POS]:    CLI interactive flow
[UPDATE]: When the approval prompt gains options
*/

use anyhow::Result;
use console::style;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use qubic_task_adapter::TaskSnapshot;
use qubic_task_observer::approval::{DEFAULT_APPROVE_REASON, DEFAULT_REJECT_REASON};

/// A decision picked at the prompt.
#[derive(Debug, Clone)]
pub struct DecisionChoice {
    pub approved: bool,
    pub reason: String,
}

/// Remembers the approval episode the user already answered, so repeated
/// view updates within that episode do not prompt again.
#[derive(Debug, Default)]
pub struct PromptTracker {
    answered_episode: Option<u64>,
}

impl PromptTracker {
    pub fn should_prompt(&self, episode: u64) -> bool {
        self.answered_episode != Some(episode)
    }

    pub fn mark_answered(&mut self, episode: u64) {
        self.answered_episode = Some(episode);
    }
}

/// Ask whether to approve the task. `None` means decide later.
///
/// Blocks on terminal input; call from a blocking thread.
pub fn prompt_decision(task: &TaskSnapshot) -> Result<Option<DecisionChoice>> {
    let theme = ColorfulTheme::default();
    println!(
        "{} {}",
        style("Approval required for task").bold().color256(208),
        style(&task.task_id).cyan()
    );

    let actions = ["Approve", "Reject", "Decide later"];
    let selection = Select::with_theme(&theme)
        .with_prompt("Select action")
        .items(&actions)
        .default(0)
        .interact()?;

    let approved = match selection {
        0 => true,
        1 => false,
        _ => return Ok(None),
    };
    let default_reason = if approved {
        DEFAULT_APPROVE_REASON
    } else {
        DEFAULT_REJECT_REASON
    };
    let reason: String = Input::with_theme(&theme)
        .with_prompt("Reason")
        .default(default_reason.to_string())
        .interact_text()?;

    Ok(Some(DecisionChoice { approved, reason }))
}
