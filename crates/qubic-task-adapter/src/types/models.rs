/*
[INPUT]:  Gateway status and audit payloads
[OUTPUT]: Task snapshots and ordered audit logs
[POS]:    Data layer - observed task state
[UPDATE]: When API schema changes or new types added
[UPDATE]: 2026-10-12 accept both qubic_txid and external_txid on audit entries
*/

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{StepStatus, TaskStatus, TaskType};

/// Last-known state of one remote task.
///
/// A snapshot is always replaced wholesale by the next fetch; fields are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u32>,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(
        default,
        deserialize_with = "serde_helpers::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub plan_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskSnapshot {
    /// Progress as `(current, total)` when the engine reported both counters consistently.
    pub fn progress(&self) -> Option<(u32, u32)> {
        match (self.current_step, self.total_steps) {
            (Some(current), Some(total)) if current <= total => Some((current, total)),
            _ => None,
        }
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

/// One immutable record of a step's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub step_index: u32,
    pub step_type: String,
    pub status: StepStatus,
    #[serde(
        rename = "qubic_txid",
        alias = "external_txid",
        default,
        deserialize_with = "serde_helpers::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
}

impl AuditEntry {
    /// Whether this step produced an independently verifiable on-chain effect.
    pub fn is_on_chain(&self) -> bool {
        self.external_txid.is_some()
    }
}

/// Ordered step history for one task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub logs: Vec<AuditEntry>,
    #[serde(
        rename = "qubic_txid",
        alias = "latest_txid",
        default,
        deserialize_with = "serde_helpers::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_txid: Option<String>,
}

impl AuditLog {
    pub fn empty(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            logs: Vec::new(),
            latest_txid: None,
        }
    }

    pub fn entry(&self, step_index: u32) -> Option<&AuditEntry> {
        self.logs.iter().find(|entry| entry.step_index == step_index)
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Parse gateway timestamps, which are either RFC 3339 or naive UTC ISO-8601.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

mod serde_helpers {
    use serde::{Deserialize, Deserializer};

    pub fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|raw| !raw.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_deserializes_gateway_payload() {
        let payload = json!({
            "task_id": "t-1",
            "status": "executing",
            "created_at": "2026-10-01T12:00:00.123456",
            "updated_at": "2026-10-01T12:00:03.5",
            "plan_id": "",
            "current_step": 2,
            "requires_approval": false
        });

        let snapshot: TaskSnapshot = serde_json::from_value(payload).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Executing);
        assert_eq!(snapshot.current_step, Some(2));
        assert_eq!(snapshot.total_steps, None);
        assert_eq!(snapshot.plan_id, None);
        assert!(snapshot.progress().is_none());
        assert!(snapshot.updated_at_utc().is_some());
    }

    #[test]
    fn test_progress_rejects_inconsistent_counters() {
        let snapshot = TaskSnapshot {
            task_id: "t-1".to_string(),
            task_type: None,
            status: TaskStatus::Executing,
            current_step: Some(4),
            total_steps: Some(3),
            requires_approval: false,
            plan_id: None,
            created_at: None,
            updated_at: None,
            message: None,
        };
        assert_eq!(snapshot.progress(), None);
    }

    #[test]
    fn test_audit_log_txid_aliases() {
        let payload = json!({
            "task_id": "t-1",
            "logs": [
                {"step_index": 0, "step_type": "check_balance", "status": "success", "qubic_txid": null},
                {"step_index": 1, "step_type": "onchain_action", "status": "success", "external_txid": "TX42"},
                {"step_index": 2, "step_type": "audit", "status": "success", "qubic_txid": ""}
            ],
            "latest_txid": "TX42"
        });

        let log: AuditLog = serde_json::from_value(payload).unwrap();
        assert_eq!(log.logs.len(), 3);
        assert!(!log.logs[0].is_on_chain());
        assert_eq!(log.logs[1].external_txid.as_deref(), Some("TX42"));
        assert!(!log.logs[2].is_on_chain());
        assert_eq!(log.latest_txid.as_deref(), Some("TX42"));
        assert_eq!(log.entry(1).map(|e| e.step_type.as_str()), Some("onchain_action"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2026-10-01T12:00:00Z").is_some());
        assert!(parse_timestamp("2026-10-01T12:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
