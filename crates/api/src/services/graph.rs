// Graph aggregator: views derived from accounts, videos and subscription edges
// Decision: Each view comes from one storage call (one statement / one lock scope),
// so counts and the viewer flag always agree

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vidora_storage::{ChannelProfileRow, StorageBackend, WatchHistoryRow};

use super::video::Video;
use crate::error::ApiError;

/// Channel profile as seen by a particular viewer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    /// Accounts subscribed to this channel
    pub subscribers_count: i64,
    /// Channels this account subscribes to
    pub subscriptions_count: i64,
    pub is_subscribed_by_viewer: bool,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

impl From<ChannelProfileRow> for ChannelProfile {
    fn from(row: ChannelProfileRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            username: row.username,
            email: row.email,
            subscribers_count: row.subscribers_count,
            subscriptions_count: row.subscriptions_count,
            is_subscribed_by_viewer: row.is_subscribed,
            avatar_url: row.avatar_url,
            cover_image_url: row.cover_image_url,
        }
    }
}

/// Public projection of a video owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub full_name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WatchHistoryEntry {
    pub video: Video,
    pub owner: VideoOwner,
}

impl From<WatchHistoryRow> for WatchHistoryEntry {
    fn from(row: WatchHistoryRow) -> Self {
        Self {
            video: row.video.into(),
            owner: VideoOwner {
                full_name: row.owner_full_name,
                username: row.owner_username,
                avatar_url: row.owner_avatar_url,
            },
        }
    }
}

#[derive(Clone)]
pub struct GraphAggregator {
    db: StorageBackend,
}

impl GraphAggregator {
    pub fn new(db: StorageBackend) -> Self {
        Self { db }
    }

    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<ChannelProfile, ApiError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ApiError::validation("username is missing"));
        }

        self.db
            .get_channel_profile(username, viewer_id)
            .await?
            .map(ChannelProfile::from)
            .ok_or_else(|| ApiError::not_found("channel does not exist"))
    }

    /// Full watch history in stored order; no dedup, no pagination.
    /// Entries whose video was deleted are skipped.
    pub async fn watch_history(&self, account_id: Uuid) -> Result<Vec<WatchHistoryEntry>, ApiError> {
        let rows = self.db.get_watch_history(account_id).await?;
        Ok(rows.into_iter().map(WatchHistoryEntry::from).collect())
    }
}
