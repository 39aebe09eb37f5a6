/*
[INPUT]:  HTTP client configuration and gateway endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod audit;
pub mod client;
pub mod error;
pub mod health;
pub mod task;

pub use error::{GatewayError, Result};

pub use client::{ClientConfig, DEFAULT_BASE_URL, GatewayClient};
