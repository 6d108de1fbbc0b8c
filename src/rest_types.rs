use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub message: String,
    pub recipient: String,
}

/// Envelope returned by the dashboard API. Only `success` drives control
/// flow; `message` and `data` are carried for display and debugging.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub bot_status: Option<String>,
    pub login_status: Option<String>,
    pub timestamp: Option<String>,
}
