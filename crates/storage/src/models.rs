// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Accounts
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    /// Always stored lowercase
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    /// SHA-256 digest of the one live refresh token, if any
    pub refresh_token: Option<String>,
    /// Watched video ids in append order
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAccountRow {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

// ============================================
// Videos
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct VideoRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub description: String,
    /// Seconds, as reported by the media service
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateVideoRow {
    pub owner_id: Uuid,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub description: String,
    pub duration: f64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

// ============================================
// Social graph (derived views)
// ============================================

/// Channel profile computed from one consistent read
#[derive(Debug, Clone, FromRow)]
pub struct ChannelProfileRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub subscribers_count: i64,
    pub subscriptions_count: i64,
    pub is_subscribed: bool,
}

/// One watch-history entry: the video joined with its owner's public projection.
/// Owner credential fields are never selected.
#[derive(Debug, Clone, FromRow)]
pub struct WatchHistoryRow {
    #[sqlx(flatten)]
    pub video: VideoRow,
    pub owner_full_name: String,
    pub owner_username: String,
    pub owner_avatar_url: Option<String>,
}
