// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
// Decision: Every call carries the deployment timeout; expiry surfaces as
// StorageError::Unavailable (retryable), never as an auth failure
//
// This module provides a unified StorageBackend that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::memory::InMemoryDatabase;
use crate::models::*;
use crate::repositories::Database;

pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
enum Backend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub struct StorageBackend {
    backend: Backend,
    timeout: Duration,
    /// Delay injected before every call so tests can force interleaving and timeouts
    #[cfg(any(test, feature = "test-util"))]
    latency: Duration,
}

/// Run the same call against whichever backend is active, bounded by the timeout
macro_rules! dispatch {
    ($self:ident, $method:ident($($arg:expr),*)) => {{
        let call = async {
            $self.simulate_latency().await;
            match &$self.backend {
                Backend::Postgres(db) => db.$method($($arg),*).await,
                Backend::InMemory(db) => db.$method($($arg),*).await,
            }
        };
        match tokio::time::timeout($self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation = stringify!($method),
                    timeout_ms = $self.timeout.as_millis() as u64,
                    "Storage call timed out"
                );
                Err(StorageError::unavailable(concat!(stringify!($method), " timed out")))
            }
        }
    }};
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let db = Database::from_url(database_url, max_connections, timeout).await?;
        db.migrate().await?;
        Ok(Self {
            backend: Backend::Postgres(db),
            timeout,
            #[cfg(any(test, feature = "test-util"))]
            latency: Duration::ZERO,
        })
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::InMemory(Arc::new(InMemoryDatabase::new())),
            timeout: DEFAULT_STORAGE_TIMEOUT,
            #[cfg(any(test, feature = "test-util"))]
            latency: Duration::ZERO,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Same store, but every call first sleeps for `latency`
    #[cfg(any(test, feature = "test-util"))]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[cfg(any(test, feature = "test-util"))]
    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    #[cfg(not(any(test, feature = "test-util")))]
    async fn simulate_latency(&self) {}

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self.backend, Backend::InMemory(_))
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: CreateAccountRow) -> Result<AccountRow> {
        dispatch!(self, create_account(input))
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        dispatch!(self, get_account(id))
    }

    pub async fn find_account_by_identifier(&self, identifier: &str) -> Result<Option<AccountRow>> {
        dispatch!(self, find_account_by_identifier(identifier))
    }

    pub async fn update_account(&self, id: Uuid, input: UpdateAccount) -> Result<Option<AccountRow>> {
        dispatch!(self, update_account(id, input))
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        dispatch!(self, set_password_hash(id, password_hash))
    }

    pub async fn set_refresh_token(&self, id: Uuid, token_hash: Option<&str>) -> Result<bool> {
        dispatch!(self, set_refresh_token(id, token_hash))
    }

    pub async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool> {
        dispatch!(self, rotate_refresh_token(id, expected_hash, new_hash))
    }

    // ============================================
    // Social graph
    // ============================================

    pub async fn get_channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfileRow>> {
        dispatch!(self, get_channel_profile(username, viewer_id))
    }

    pub async fn get_watch_history(&self, account_id: Uuid) -> Result<Vec<WatchHistoryRow>> {
        dispatch!(self, get_watch_history(account_id))
    }

    pub async fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<()> {
        dispatch!(self, subscribe(subscriber_id, channel_id))
    }

    pub async fn unsubscribe(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        dispatch!(self, unsubscribe(subscriber_id, channel_id))
    }

    // ============================================
    // Videos
    // ============================================

    pub async fn create_video(&self, input: CreateVideoRow) -> Result<VideoRow> {
        dispatch!(self, create_video(input))
    }

    pub async fn get_video(&self, id: Uuid) -> Result<Option<VideoRow>> {
        dispatch!(self, get_video(id))
    }

    pub async fn update_video(&self, id: Uuid, input: UpdateVideo) -> Result<Option<VideoRow>> {
        dispatch!(self, update_video(id, input))
    }

    pub async fn set_video_published(&self, id: Uuid, is_published: bool) -> Result<Option<VideoRow>> {
        dispatch!(self, set_video_published(id, is_published))
    }

    pub async fn delete_video(&self, id: Uuid) -> Result<bool> {
        dispatch!(self, delete_video(id))
    }

    pub async fn record_video_view(&self, video_id: Uuid, viewer_id: Uuid) -> Result<bool> {
        dispatch!(self, record_video_view(video_id, viewer_id))
    }
}
