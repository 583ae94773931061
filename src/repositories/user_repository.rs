use async_trait::async_trait;
use chrono::Utc;

use super::{PgStore, UserRepository};
use crate::models::user::{NewUser, Team, User};
use crate::utils::errors::{conflict_error, AppError, AppResult};

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role, country, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.country)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(conflict_error("User", "email", &user.email))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn create_team(&self, name: String, country: Option<String>, leader_id: i64) -> AppResult<Team> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name, country, leader_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(country)
        .bind(leader_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(team)
    }

    async fn find_team(&self, id: i64) -> AppResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(team)
    }

    async fn add_team_member(&self, team_id: i64, user_id: i64) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO team_members (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn team_member_ids(&self, team_id: i64) -> AppResult<Vec<i64>> {
        let ids: Vec<(i64,)> =
            sqlx::query_as("SELECT user_id FROM team_members WHERE team_id = $1 ORDER BY user_id")
                .bind(team_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn member_ids_led_by(&self, leader_id: i64) -> AppResult<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT tm.user_id
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            WHERE t.leader_id = $1
            ORDER BY tm.user_id
            "#,
        )
        .bind(leader_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}
