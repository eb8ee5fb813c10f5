// PostgreSQL repository
// Decision: Plain sqlx::query_as (no compile-time checked macros) so builds don't need a live DB
// Decision: Graph aggregates are single statements so they read one snapshot

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Internal(e.into()))
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: CreateAccountRow) -> Result<AccountRow> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, username, email, full_name, password_hash, avatar_url, cover_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, full_name, password_hash, avatar_url, cover_image_url,
                      refresh_token, watch_history, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.full_name)
        .bind(&input.password_hash)
        .bind(&input.avatar_url)
        .bind(&input.cover_image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, email, full_name, password_hash, avatar_url, cover_image_url,
                   refresh_token, watch_history, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Match on lowercase username or exact email
    pub async fn find_account_by_identifier(&self, identifier: &str) -> Result<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, email, full_name, password_hash, avatar_url, cover_image_url,
                   refresh_token, watch_history, created_at, updated_at
            FROM accounts
            WHERE username = LOWER($1) OR email = $1
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_account(&self, id: Uuid, input: UpdateAccount) -> Result<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                avatar_url = COALESCE($4, avatar_url),
                cover_image_url = COALESCE($5, cover_image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, full_name, password_hash, avatar_url, cover_image_url,
                      refresh_token, watch_history, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.avatar_url)
        .bind(&input.cover_image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unconditionally replace (or clear) the stored refresh token digest
    pub async fn set_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Compare-and-swap on the stored refresh token digest.
    /// Returns false when the stored value no longer equals `expected_hash`.
    pub async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(id)
        .bind(expected_hash)
        .bind(new_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // ============================================
    // Social graph
    // ============================================

    pub async fn get_channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfileRow>> {
        let row = sqlx::query_as::<_, ChannelProfileRow>(
            r#"
            SELECT
                a.id, a.username, a.email, a.full_name, a.avatar_url, a.cover_image_url,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = a.id) AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = a.id) AS subscriptions_count,
                EXISTS (
                    SELECT 1 FROM subscriptions s
                    WHERE s.channel_id = a.id AND s.subscriber_id = $2
                ) AS is_subscribed
            FROM accounts a
            WHERE a.username = LOWER($1)
            "#,
        )
        .bind(username)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Expand the watch history in stored order. Videos deleted since they were
    /// watched drop out of the join.
    pub async fn get_watch_history(&self, account_id: Uuid) -> Result<Vec<WatchHistoryRow>> {
        let rows = sqlx::query_as::<_, WatchHistoryRow>(
            r#"
            SELECT
                v.id, v.owner_id, v.video_url, v.thumbnail_url, v.title, v.description,
                v.duration, v.views, v.is_published, v.created_at, v.updated_at,
                o.full_name AS owner_full_name,
                o.username AS owner_username,
                o.avatar_url AS owner_avatar_url
            FROM accounts a
            CROSS JOIN LATERAL unnest(a.watch_history) WITH ORDINALITY AS h(video_id, position)
            JOIN videos v ON v.id = h.video_id
            JOIN accounts o ON o.id = v.owner_id
            WHERE a.id = $1
            ORDER BY h.position
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (subscriber_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT (subscriber_id, channel_id) DO NOTHING
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn unsubscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Videos
    // ============================================

    pub async fn create_video(&self, input: CreateVideoRow) -> Result<VideoRow> {
        let row = sqlx::query_as::<_, VideoRow>(
            r#"
            INSERT INTO videos (id, owner_id, video_url, thumbnail_url, title, description, duration, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING id, owner_id, video_url, thumbnail_url, title, description, duration, views,
                      is_published, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.owner_id)
        .bind(&input.video_url)
        .bind(&input.thumbnail_url)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.duration)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_video(&self, id: Uuid) -> Result<Option<VideoRow>> {
        let row = sqlx::query_as::<_, VideoRow>(
            r#"
            SELECT id, owner_id, video_url, thumbnail_url, title, description, duration, views,
                   is_published, created_at, updated_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_video(&self, id: Uuid, input: UpdateVideo) -> Result<Option<VideoRow>> {
        let row = sqlx::query_as::<_, VideoRow>(
            r#"
            UPDATE videos
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail_url = COALESCE($4, thumbnail_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, video_url, thumbnail_url, title, description, duration, views,
                      is_published, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.thumbnail_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn set_video_published(&self, id: Uuid, is_published: bool) -> Result<Option<VideoRow>> {
        let row = sqlx::query_as::<_, VideoRow>(
            r#"
            UPDATE videos
            SET is_published = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, video_url, thumbnail_url, title, description, duration, views,
                      is_published, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_published)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_video(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Bump the view counter and append to the viewer's history in one transaction
    pub async fn record_video_view(&self, video_id: Uuid, viewer_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE accounts
            SET watch_history = array_append(watch_history, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(viewer_id)
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
