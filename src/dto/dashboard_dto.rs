use serde::Serialize;
use std::collections::BTreeMap;

/// Resumen del dashboard dentro del alcance del usuario
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub home_route: &'static str,
    pub total_leads: usize,
    pub unassigned_leads: usize,
    pub by_stage: BTreeMap<&'static str, usize>,
    pub sla_warnings: usize,
    pub sla_breaches: usize,
}
