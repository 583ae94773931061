use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::{ActivityRepository, PgStore};
use crate::models::activity::{Activity, ActivityFilter, NewActivity};
use crate::utils::errors::AppResult;

/// Inserta una actividad dentro de la conexión/transacción recibida
pub(crate) async fn insert_activity(conn: &mut PgConnection, activity: &NewActivity) -> AppResult<Activity> {
    let row = sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (lead_id, user_id, action, module, details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(activity.lead_id)
    .bind(activity.user_id)
    .bind(activity.action)
    .bind(activity.action.module())
    .bind(&activity.details)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

#[async_trait]
impl ActivityRepository for PgStore {
    async fn append_activity(&self, activity: NewActivity) -> AppResult<Activity> {
        let mut conn = self.pool.acquire().await?;
        insert_activity(&mut *conn, &activity).await
    }

    async fn list_activities(&self, filter: &ActivityFilter) -> AppResult<Vec<Activity>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM activities WHERE TRUE");

        if let Some(lead_id) = filter.lead_id {
            query.push(" AND lead_id = ").push_bind(lead_id);
        }
        if let Some(user_ids) = &filter.user_ids {
            query.push(" AND user_id = ANY(").push_bind(user_ids.clone()).push(")");
        }
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit.max(1));

        let activities = query
            .build_query_as::<Activity>()
            .fetch_all(&self.pool)
            .await?;

        Ok(activities)
    }
}
