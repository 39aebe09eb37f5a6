/*
[INPUT]:  None
[OUTPUT]: Gateway liveness report
[POS]:    HTTP layer - unauthenticated probe endpoint
[UPDATE]: When the health payload changes
*/

use reqwest::Method;

use crate::http::{GatewayClient, Result};
use crate::types::HealthResponse;

impl GatewayClient {
    /// Probe the gateway
    ///
    /// GET /health
    pub async fn health(&self) -> Result<HealthResponse> {
        let builder = self.request(Method::GET, &["health"])?;
        self.send_json(builder, "health", "gateway").await
    }
}
