/*
[INPUT]:  Task id
[OUTPUT]: Step history with external transaction references
[POS]:    HTTP layer - audit trail endpoint
[UPDATE]: When the audit payload changes
*/

use reqwest::Method;

use crate::http::{GatewayClient, Result};
use crate::types::AuditLog;

impl GatewayClient {
    /// Fetch the audit log of a task
    ///
    /// GET /audit/{task_id}
    pub async fn get_audit_log(&self, task_id: &str) -> Result<AuditLog> {
        let builder = self.request(Method::GET, &["audit", task_id])?;
        let mut log: AuditLog = self.send_json(builder, "audit log", task_id).await?;
        if log.task_id.is_empty() {
            log.task_id = task_id.to_string();
        }
        Ok(log)
    }
}
