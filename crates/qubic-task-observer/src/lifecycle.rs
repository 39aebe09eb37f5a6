/*
[INPUT]:  Observed TaskStatus values in fetch order
[OUTPUT]: Transition classification and per-status side effects
[POS]:    Task domain logic - client-side interpretation of the engine state machine
[UPDATE]: When the engine's lifecycle gains states or edges
*/

use qubic_task_adapter::{TaskSnapshot, TaskStatus};

static KNOWN_STATES: [TaskStatus; 7] = [
    TaskStatus::Pending,
    TaskStatus::Executing,
    TaskStatus::WaitingApproval,
    TaskStatus::Approved,
    TaskStatus::Rejected,
    TaskStatus::Completed,
    TaskStatus::Failed,
];

/// Whether the engine may move a task from `from` to `to` in one step.
pub fn can_transition(from: &TaskStatus, to: &TaskStatus) -> bool {
    use TaskStatus::*;
    match (from, to) {
        (Pending, Executing) => true,
        (Pending, Failed) => true,
        (Executing, WaitingApproval) => true,
        (Executing, Completed) => true,
        (Executing, Failed) => true,
        (WaitingApproval, Approved) => true,
        (WaitingApproval, Rejected) => true,
        // Engine resumes directly on approval, or finishes within the same tick.
        (WaitingApproval, Executing) => true,
        (WaitingApproval, Completed) => true,
        (WaitingApproval, Failed) => true,
        (Approved, Executing) => true,
        (Approved, Completed) => true,
        (Approved, Failed) => true,
        (Rejected, Failed) => true,
        _ => false,
    }
}

/// Whether `to` can follow `from` through any number of legal edges.
pub fn is_reachable(from: &TaskStatus, to: &TaskStatus) -> bool {
    let mut visited: Vec<&TaskStatus> = vec![from];
    let mut frontier: Vec<&TaskStatus> = vec![from];

    while let Some(current) = frontier.pop() {
        for next in KNOWN_STATES.iter().filter(|next| can_transition(current, next)) {
            if next == to {
                return true;
            }
            if !visited.contains(&next) {
                visited.push(next);
                frontier.push(next);
            }
        }
    }
    false
}

/// Side effects a client should perform for an observed snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpretation {
    /// Steps may exist, so the audit log is worth fetching
    pub fetch_audit: bool,
    /// Approve/reject controls may be presented
    pub approval_enabled: bool,
    /// The snapshot will not change again
    pub terminal: bool,
}

pub fn interpret(snapshot: &TaskSnapshot) -> Interpretation {
    let status = &snapshot.status;
    Interpretation {
        fetch_audit: *status != TaskStatus::Pending,
        approval_enabled: status.awaits_decision() && snapshot.requires_approval,
        terminal: status.is_terminal(),
    }
}

/// How a newly observed status relates to the last known one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// First known status of the session
    Initial(TaskStatus),
    Unchanged(TaskStatus),
    /// One legal edge
    Advanced { from: TaskStatus, to: TaskStatus },
    /// Legal, but intermediate states were not observed between polls
    Leapt { from: TaskStatus, to: TaskStatus },
    /// Not reachable from the last known state
    Regressed { from: TaskStatus, to: TaskStatus },
    /// Outside the closed set; displayed verbatim
    Unrecognized(String),
}

impl Observation {
    /// Whether the snapshot carrying this status may replace the current one
    pub fn is_applicable(&self) -> bool {
        !matches!(self, Observation::Regressed { .. })
    }
}

/// Tracks the last recognized status of one observed task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleTracker {
    last_known: Option<TaskStatus>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_known(&self) -> Option<&TaskStatus> {
        self.last_known.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.last_known.as_ref().is_some_and(TaskStatus::is_terminal)
    }

    /// Classify `status` and, unless it regresses, make it the last known state.
    pub fn observe(&mut self, status: &TaskStatus) -> Observation {
        if let TaskStatus::Unknown(raw) = status {
            return Observation::Unrecognized(raw.clone());
        }

        let observation = match self.last_known.take() {
            None => Observation::Initial(status.clone()),
            Some(from) if from == *status => Observation::Unchanged(from),
            Some(from) if can_transition(&from, status) => Observation::Advanced {
                from,
                to: status.clone(),
            },
            Some(from) if is_reachable(&from, status) => Observation::Leapt {
                from,
                to: status.clone(),
            },
            Some(from) => {
                self.last_known = Some(from.clone());
                return Observation::Regressed {
                    from,
                    to: status.clone(),
                };
            }
        };

        self.last_known = Some(status.clone());
        observation
    }
}
