use chrono::{DateTime, Utc};

use crate::dto::dashboard_dto::DashboardSummary;
use crate::models::auth::Identity;
use crate::models::lead::Stage;
use crate::models::sla::SlaStatus;
use crate::repositories::{SharedStore, SlaRepository};
use crate::services::access_service::{home_route_for, LeadScope};
use crate::services::lead_service::collect_scoped_leads;
use crate::services::sla_service;
use crate::utils::errors::AppResult;

/// Agregados del dashboard
pub struct DashboardService {
    store: SharedStore,
}

impl DashboardService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn summary(&self, identity: &Identity, now: DateTime<Utc>) -> AppResult<DashboardSummary> {
        let scope = LeadScope::for_identity(identity);
        let leads = collect_scoped_leads(self.store.as_ref(), &scope).await?;
        let config = self.store.sla_config().await?.unwrap_or_default();

        let mut summary = DashboardSummary {
            home_route: home_route_for(identity),
            total_leads: leads.len(),
            by_stage: Stage::ALL.iter().map(|stage| (stage.as_str(), 0)).collect(),
            ..Default::default()
        };

        for lead in &leads {
            *summary.by_stage.entry(lead.stage.as_str()).or_default() += 1;
            if lead.assigned_to_id.is_none() {
                summary.unassigned_leads += 1;
            }
            if lead.stage.is_terminal() {
                continue;
            }
            match sla_service::evaluate(lead, &config, now).status {
                SlaStatus::Warning => summary.sla_warnings += 1,
                SlaStatus::Breached => summary.sla_breaches += 1,
                SlaStatus::OnTime => {}
            }
        }

        Ok(summary)
    }
}
