//! Historial por lead y feed de actividad del equipo

use crate::models::activity::{Activity, ActivityFilter};
use crate::models::auth::Identity;
use crate::repositories::{ActivityRepository, SharedStore};
use crate::services::access_service::AuthorScope;
use crate::services::lead_service::find_accessible_lead;
use crate::utils::errors::AppResult;

pub const DEFAULT_FEED_LIMIT: i64 = 50;
pub const MAX_FEED_LIMIT: i64 = 200;

fn feed_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT)
}

pub struct ActivityService {
    store: SharedStore,
}

impl ActivityService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Auditoría completa de un lead visible para la identidad
    pub async fn lead_activities(
        &self,
        identity: &Identity,
        lead_id: i64,
        limit: Option<i64>,
    ) -> AppResult<Vec<Activity>> {
        let lead = find_accessible_lead(self.store.as_ref(), identity, lead_id, "read lead activity").await?;

        self.store
            .list_activities(&ActivityFilter {
                lead_id: Some(lead.id),
                user_ids: None,
                limit: feed_limit(limit),
            })
            .await
    }

    /// Acciones de los usuarios que la identidad supervisa
    pub async fn feed(&self, identity: &Identity, limit: Option<i64>) -> AppResult<Vec<Activity>> {
        let user_ids = match AuthorScope::for_identity(identity) {
            AuthorScope::Everyone => None,
            AuthorScope::Only(ids) => Some(ids),
            AuthorScope::Nobody => return Ok(Vec::new()),
        };

        self.store
            .list_activities(&ActivityFilter {
                lead_id: None,
                user_ids,
                limit: feed_limit(limit),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::lead_dto::CreateLeadRequest;
    use crate::models::activity::ActivityType;
    use crate::models::auth::Role;
    use crate::services::lead_service::LeadService;
    use crate::services::test_support::{seed_team, seed_user, store};

    #[test]
    fn test_feed_limit_bounds() {
        assert_eq!(feed_limit(None), DEFAULT_FEED_LIMIT);
        assert_eq!(feed_limit(Some(0)), 1);
        assert_eq!(feed_limit(Some(10_000)), MAX_FEED_LIMIT);
    }

    #[tokio::test]
    async fn test_feed_is_scoped_by_author() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let member = seed_user(&store, Role::Counselor).await;
        let outsider = seed_user(&store, Role::Counselor).await;
        let leader = seed_team(&store, &[member.id]).await;
        let leads = LeadService::new(store.clone());

        for (n, actor) in [&member, &outsider].into_iter().enumerate() {
            leads
                .create_lead(
                    actor,
                    CreateLeadRequest {
                        name: format!("Lead {}", n),
                        email: Some(format!("lead{}@example.com", n)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let service = ActivityService::new(store);
        let team_feed = service.feed(&leader, None).await.unwrap();
        assert_eq!(team_feed.len(), 1);
        assert_eq!(team_feed[0].user_id, member.id);

        assert_eq!(service.feed(&admin, None).await.unwrap().len(), 2);
        assert_eq!(service.feed(&outsider, None).await.unwrap().len(), 1);

        let ghost = Identity::from_raw_role(500, "VISITOR", None);
        assert!(service.feed(&ghost, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lead_trail_newest_first() {
        let store = store();
        let admin = seed_user(&store, Role::Admin).await;
        let leads = LeadService::new(store.clone());
        let lead = leads
            .create_lead(
                &admin,
                CreateLeadRequest {
                    name: "Trail".to_string(),
                    email: Some("trail@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .lead;
        leads.update_stage(&admin, lead.id, "CONTACTED").await.unwrap();

        let trail = ActivityService::new(store)
            .lead_activities(&admin, lead.id, None)
            .await
            .unwrap();
        let actions: Vec<ActivityType> = trail.iter().map(|a| a.action).collect();
        assert_eq!(actions, vec![ActivityType::StageChanged, ActivityType::LeadCreated]);
        assert_eq!(trail[0].details["from"], "NEW");
        assert_eq!(trail[0].details["to"], "CONTACTED");
    }
}
