use serde::{Deserialize, Serialize};

use crate::summary::SummaryOutcome;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub outcome: SummaryOutcome,
    /// Rendered message text, ready to forward to a chat
    pub message: String,
}

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub handle: String,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub handle: String,
    pub subscribed: bool,
}
