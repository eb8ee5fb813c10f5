// Subscription service: toggles the caller's edge to a channel

use uuid::Uuid;
use vidora_storage::StorageBackend;

use crate::error::ApiError;

#[derive(Clone)]
pub struct SubscriptionService {
    db: StorageBackend,
}

impl SubscriptionService {
    pub fn new(db: StorageBackend) -> Self {
        Self { db }
    }

    /// Subscribe or unsubscribe; returns whether the caller is now subscribed
    pub async fn toggle(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool, ApiError> {
        if subscriber_id == channel_id {
            return Err(ApiError::validation("Cannot subscribe to your own channel"));
        }
        if self.db.get_account(channel_id).await?.is_none() {
            return Err(ApiError::not_found("channel does not exist"));
        }

        if self.db.unsubscribe(subscriber_id, channel_id).await? {
            tracing::debug!(%subscriber_id, %channel_id, "Unsubscribed");
            return Ok(false);
        }

        self.db.subscribe(subscriber_id, channel_id).await?;
        tracing::debug!(%subscriber_id, %channel_id, "Subscribed");
        Ok(true)
    }
}
