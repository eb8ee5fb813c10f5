// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
// Decision: When several tables are needed, locks are taken in the order
// accounts -> videos -> subscriptions so derived views see one snapshot
//
// This implementation mirrors the PostgreSQL repository so the server and
// the test suite can run without a database.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    accounts: RwLock<HashMap<Uuid, AccountRow>>,
    videos: RwLock<HashMap<Uuid, VideoRow>>,
    /// (subscriber_id, channel_id)
    subscriptions: RwLock<HashSet<(Uuid, Uuid)>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: CreateAccountRow) -> Result<AccountRow> {
        let mut accounts = self.accounts.write();
        if accounts.values().any(|a| a.username == input.username) {
            return Err(StorageError::conflict("username"));
        }
        if accounts.values().any(|a| a.email == input.email) {
            return Err(StorageError::conflict("email"));
        }

        let now = Self::now();
        let id = Uuid::now_v7();
        let row = AccountRow {
            id,
            username: input.username,
            email: input.email,
            full_name: input.full_name,
            password_hash: input.password_hash,
            avatar_url: input.avatar_url,
            cover_image_url: input.cover_image_url,
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        accounts.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        Ok(self.accounts.read().get(&id).cloned())
    }

    pub async fn find_account_by_identifier(&self, identifier: &str) -> Result<Option<AccountRow>> {
        let username = identifier.to_lowercase();
        Ok(self
            .accounts
            .read()
            .values()
            .find(|a| a.username == username || a.email == identifier)
            .cloned())
    }

    pub async fn update_account(&self, id: Uuid, input: UpdateAccount) -> Result<Option<AccountRow>> {
        let mut accounts = self.accounts.write();
        if let Some(email) = &input.email {
            if accounts.values().any(|a| a.id != id && &a.email == email) {
                return Err(StorageError::conflict("email"));
            }
        }

        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(full_name) = input.full_name {
            account.full_name = full_name;
        }
        if let Some(email) = input.email {
            account.email = email;
        }
        if let Some(avatar_url) = input.avatar_url {
            account.avatar_url = Some(avatar_url);
        }
        if let Some(cover_image_url) = input.cover_image_url {
            account.cover_image_url = Some(cover_image_url);
        }
        account.updated_at = Self::now();
        Ok(Some(account.clone()))
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        match self.accounts.write().get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Self::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn set_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> Result<bool> {
        match self.accounts.write().get_mut(&id) {
            Some(account) => {
                account.refresh_token = token_hash.map(str::to_string);
                account.updated_at = Self::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Compare and swap under the write lock, so two racing rotations of the
    /// same token cannot both succeed
    pub async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool> {
        let mut accounts = self.accounts.write();
        match accounts.get_mut(&id) {
            Some(account) if account.refresh_token.as_deref() == Some(expected_hash) => {
                account.refresh_token = Some(new_hash.to_string());
                account.updated_at = Self::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // ============================================
    // Social graph
    // ============================================

    pub async fn get_channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfileRow>> {
        let accounts = self.accounts.read();
        let subscriptions = self.subscriptions.read();

        let username = username.to_lowercase();
        let Some(channel) = accounts.values().find(|a| a.username == username) else {
            return Ok(None);
        };

        let subscribers_count = subscriptions
            .iter()
            .filter(|(_, ch)| *ch == channel.id)
            .count() as i64;
        let subscriptions_count = subscriptions
            .iter()
            .filter(|(sub, _)| *sub == channel.id)
            .count() as i64;

        Ok(Some(ChannelProfileRow {
            id: channel.id,
            username: channel.username.clone(),
            email: channel.email.clone(),
            full_name: channel.full_name.clone(),
            avatar_url: channel.avatar_url.clone(),
            cover_image_url: channel.cover_image_url.clone(),
            subscribers_count,
            subscriptions_count,
            is_subscribed: subscriptions.contains(&(viewer_id, channel.id)),
        }))
    }

    pub async fn get_watch_history(&self, account_id: Uuid) -> Result<Vec<WatchHistoryRow>> {
        let accounts = self.accounts.read();
        let videos = self.videos.read();

        let Some(account) = accounts.get(&account_id) else {
            return Ok(Vec::new());
        };

        let rows = account
            .watch_history
            .iter()
            .filter_map(|video_id| {
                let video = videos.get(video_id)?;
                let owner = accounts.get(&video.owner_id)?;
                Some(WatchHistoryRow {
                    video: video.clone(),
                    owner_full_name: owner.full_name.clone(),
                    owner_username: owner.username.clone(),
                    owner_avatar_url: owner.avatar_url.clone(),
                })
            })
            .collect();

        Ok(rows)
    }

    pub async fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<()> {
        self.subscriptions.write().insert((subscriber_id, channel_id));
        Ok(())
    }

    pub async fn unsubscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        Ok(self
            .subscriptions
            .write()
            .remove(&(subscriber_id, channel_id)))
    }

    // ============================================
    // Videos
    // ============================================

    pub async fn create_video(&self, input: CreateVideoRow) -> Result<VideoRow> {
        let now = Self::now();
        let id = Uuid::now_v7();
        let row = VideoRow {
            id,
            owner_id: input.owner_id,
            video_url: input.video_url,
            thumbnail_url: input.thumbnail_url,
            title: input.title,
            description: input.description,
            duration: input.duration,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };
        self.videos.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_video(&self, id: Uuid) -> Result<Option<VideoRow>> {
        Ok(self.videos.read().get(&id).cloned())
    }

    pub async fn update_video(&self, id: Uuid, input: UpdateVideo) -> Result<Option<VideoRow>> {
        let mut videos = self.videos.write();
        let Some(video) = videos.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = input.title {
            video.title = title;
        }
        if let Some(description) = input.description {
            video.description = description;
        }
        if let Some(thumbnail_url) = input.thumbnail_url {
            video.thumbnail_url = Some(thumbnail_url);
        }
        video.updated_at = Self::now();
        Ok(Some(video.clone()))
    }

    pub async fn set_video_published(&self, id: Uuid, is_published: bool) -> Result<Option<VideoRow>> {
        let mut videos = self.videos.write();
        let Some(video) = videos.get_mut(&id) else {
            return Ok(None);
        };
        video.is_published = is_published;
        video.updated_at = Self::now();
        Ok(Some(video.clone()))
    }

    pub async fn delete_video(&self, id: Uuid) -> Result<bool> {
        Ok(self.videos.write().remove(&id).is_some())
    }

    pub async fn record_video_view(&self, video_id: Uuid, viewer_id: Uuid) -> Result<bool> {
        let mut accounts = self.accounts.write();
        let mut videos = self.videos.write();

        let Some(video) = videos.get_mut(&video_id) else {
            return Ok(false);
        };
        video.views += 1;
        if let Some(viewer) = accounts.get_mut(&viewer_id) {
            viewer.watch_history.push(video_id);
            viewer.updated_at = Self::now();
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(username: &str, email: &str) -> CreateAccountRow {
        CreateAccountRow {
            username: username.to_string(),
            email: email.to_string(),
            full_name: format!("{} Example", username),
            password_hash: "$argon2id$placeholder".to_string(),
            avatar_url: Some(format!("https://cdn.example.com/{}.png", username)),
            cover_image_url: None,
        }
    }

    fn new_video(owner_id: Uuid, title: &str) -> CreateVideoRow {
        CreateVideoRow {
            owner_id,
            video_url: format!("https://cdn.example.com/{}.mp4", title),
            thumbnail_url: None,
            title: title.to_string(),
            description: "A video".to_string(),
            duration: 12.5,
        }
    }

    #[tokio::test]
    async fn test_create_account_conflicts() {
        let db = InMemoryDatabase::new();
        db.create_account(new_account("alice", "alice@example.com"))
            .await
            .unwrap();

        let dup_username = db
            .create_account(new_account("alice", "other@example.com"))
            .await;
        assert!(matches!(dup_username, Err(StorageError::Conflict(f)) if f == "username"));

        let dup_email = db
            .create_account(new_account("alice2", "alice@example.com"))
            .await;
        assert!(matches!(dup_email, Err(StorageError::Conflict(f)) if f == "email"));
    }

    #[tokio::test]
    async fn test_find_by_identifier() {
        let db = InMemoryDatabase::new();
        let alice = db
            .create_account(new_account("alice", "alice@example.com"))
            .await
            .unwrap();

        let by_name = db.find_account_by_identifier("ALICE").await.unwrap();
        assert_eq!(by_name.map(|a| a.id), Some(alice.id));

        let by_email = db
            .find_account_by_identifier("alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.map(|a| a.id), Some(alice.id));

        assert!(db.find_account_by_identifier("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rotate_refresh_token_is_compare_and_swap() {
        let db = InMemoryDatabase::new();
        let alice = db
            .create_account(new_account("alice", "alice@example.com"))
            .await
            .unwrap();

        // Nothing stored yet
        assert!(!db.rotate_refresh_token(alice.id, "h1", "h2").await.unwrap());

        db.set_refresh_token(alice.id, Some("h1")).await.unwrap();
        assert!(db.rotate_refresh_token(alice.id, "h1", "h2").await.unwrap());
        // Stale expectation loses
        assert!(!db.rotate_refresh_token(alice.id, "h1", "h3").await.unwrap());

        let stored = db.get_account(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("h2"));

        db.set_refresh_token(alice.id, None).await.unwrap();
        assert!(!db.rotate_refresh_token(alice.id, "h2", "h4").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_account_email_conflict() {
        let db = InMemoryDatabase::new();
        let alice = db
            .create_account(new_account("alice", "alice@example.com"))
            .await
            .unwrap();
        db.create_account(new_account("bob", "bob@example.com"))
            .await
            .unwrap();

        let result = db
            .update_account(
                alice.id,
                UpdateAccount {
                    email: Some("bob@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        // Re-saving your own email is fine
        let updated = db
            .update_account(
                alice.id,
                UpdateAccount {
                    email: Some("alice@example.com".to_string()),
                    full_name: Some("Alice Liddell".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.full_name, "Alice Liddell");
    }

    #[tokio::test]
    async fn test_channel_profile_counts() {
        let db = InMemoryDatabase::new();
        let alice = db
            .create_account(new_account("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = db
            .create_account(new_account("bob", "bob@example.com"))
            .await
            .unwrap();
        let carol = db
            .create_account(new_account("carol", "carol@example.com"))
            .await
            .unwrap();

        db.subscribe(bob.id, alice.id).await.unwrap();
        db.subscribe(bob.id, alice.id).await.unwrap(); // idempotent
        db.subscribe(carol.id, alice.id).await.unwrap();
        db.subscribe(alice.id, carol.id).await.unwrap();

        let profile = db
            .get_channel_profile("alice", bob.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.subscribers_count, 2);
        assert_eq!(profile.subscriptions_count, 1);
        assert!(profile.is_subscribed);

        let as_alice = db
            .get_channel_profile("alice", alice.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!as_alice.is_subscribed);

        assert!(db.unsubscribe(bob.id, alice.id).await.unwrap());
        assert!(!db.unsubscribe(bob.id, alice.id).await.unwrap());
        let profile = db
            .get_channel_profile("alice", bob.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.subscribers_count, 1);
        assert!(!profile.is_subscribed);

        assert!(db
            .get_channel_profile("nobody", bob.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_watch_history_order_and_projection() {
        let db = InMemoryDatabase::new();
        let alice = db
            .create_account(new_account("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = db
            .create_account(new_account("bob", "bob@example.com"))
            .await
            .unwrap();

        let v1 = db.create_video(new_video(alice.id, "first")).await.unwrap();
        let v2 = db.create_video(new_video(bob.id, "second")).await.unwrap();

        assert!(db.record_video_view(v1.id, bob.id).await.unwrap());
        assert!(db.record_video_view(v2.id, bob.id).await.unwrap());
        assert!(!db.record_video_view(Uuid::now_v7(), bob.id).await.unwrap());

        let history = db.get_watch_history(bob.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].video.id, v1.id);
        assert_eq!(history[0].owner_username, "alice");
        assert_eq!(history[1].video.id, v2.id);
        assert_eq!(history[1].owner_username, "bob");
        assert_eq!(history[0].video.views, 1);

        // Deleted videos drop out, order of the rest is kept
        db.delete_video(v1.id).await.unwrap();
        let history = db.get_watch_history(bob.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].video.id, v2.id);
    }

    #[tokio::test]
    async fn test_video_update_and_publish() {
        let db = InMemoryDatabase::new();
        let alice = db
            .create_account(new_account("alice", "alice@example.com"))
            .await
            .unwrap();
        let video = db.create_video(new_video(alice.id, "clip")).await.unwrap();
        assert!(video.is_published);

        let updated = db
            .update_video(
                video.id,
                UpdateVideo {
                    title: Some("Better clip".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Better clip");
        assert_eq!(updated.description, "A video");

        let hidden = db
            .set_video_published(video.id, false)
            .await
            .unwrap()
            .unwrap();
        assert!(!hidden.is_published);

        assert!(db.delete_video(video.id).await.unwrap());
        assert!(db.get_video(video.id).await.unwrap().is_none());
    }
}
