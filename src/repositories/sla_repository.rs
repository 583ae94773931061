use async_trait::async_trait;
use chrono::Utc;

use super::activity_repository::insert_activity;
use super::{PgStore, SlaRepository};
use crate::models::activity::NewActivity;
use crate::models::sla::SlaConfig;
use crate::utils::errors::AppResult;

/// La tabla sla_config tiene una sola fila con id = 1
const SLA_CONFIG_ID: i32 = 1;

#[async_trait]
impl SlaRepository for PgStore {
    async fn sla_config(&self) -> AppResult<Option<SlaConfig>> {
        let config = sqlx::query_as::<_, SlaConfig>(
            "SELECT response_minutes, escalate_minutes FROM sla_config WHERE id = $1",
        )
        .bind(SLA_CONFIG_ID)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    async fn save_sla_config(&self, config: SlaConfig, actor_id: i64) -> AppResult<SlaConfig> {
        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, SlaConfig>(
            r#"
            INSERT INTO sla_config (id, response_minutes, escalate_minutes, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET response_minutes = EXCLUDED.response_minutes,
                escalate_minutes = EXCLUDED.escalate_minutes,
                updated_at = EXCLUDED.updated_at
            RETURNING response_minutes, escalate_minutes
            "#,
        )
        .bind(SLA_CONFIG_ID)
        .bind(config.response_minutes)
        .bind(config.escalate_minutes)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &NewActivity::sla_config_updated(&saved, actor_id)).await?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn ensure_sla_config(&self, default: SlaConfig) -> AppResult<SlaConfig> {
        sqlx::query(
            r#"
            INSERT INTO sla_config (id, response_minutes, escalate_minutes, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(SLA_CONFIG_ID)
        .bind(default.response_minutes)
        .bind(default.escalate_minutes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(self.sla_config().await?.unwrap_or(default))
    }
}
