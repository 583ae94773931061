use serde::{Deserialize, Serialize};

use crate::models::lead::Lead;
use crate::models::sla::{SlaConfig, SlaEvaluation};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSlaConfigRequest {
    pub response_minutes: i32,
    pub escalate_minutes: i32,
}

impl From<UpdateSlaConfigRequest> for SlaConfig {
    fn from(request: UpdateSlaConfigRequest) -> Self {
        Self {
            response_minutes: request.response_minutes,
            escalate_minutes: request.escalate_minutes,
        }
    }
}

/// Lead en WARNING o BREACHED, peor primero
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaBreach {
    pub lead: Lead,
    #[serde(flatten)]
    pub evaluation: SlaEvaluation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaBreachListResponse {
    pub config: SlaConfig,
    pub breaches: Vec<SlaBreach>,
}
