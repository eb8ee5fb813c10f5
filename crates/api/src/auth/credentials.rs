// Credential store: account records with hashed secrets
// Decision: Argon2 runs on the blocking pool so slow hashing never stalls the runtime
// Decision: Refresh tokens are persisted as SHA-256 digests; comparisons happen on digests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vidora_storage::{
    password::{hash_password, hash_token, verify_password},
    AccountRow, CreateAccountRow, Result, StorageBackend,
};

/// Public account view. Never carries the password hash or the refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRow> for AccountView {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            cover_image_url: row.cover_image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fields for a new account, secret still in plaintext
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Clone)]
pub struct CredentialStore {
    db: StorageBackend,
}

impl CredentialStore {
    pub fn new(db: StorageBackend) -> Self {
        Self { db }
    }

    pub async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<AccountRow>> {
        self.db.find_account_by_identifier(identifier.trim()).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<AccountRow>> {
        self.db.get_account(id).await
    }

    /// Check a plaintext secret against the stored hash
    pub async fn verify_secret(&self, account: &AccountRow, plaintext: &str) -> Result<bool> {
        let hash = account.password_hash.clone();
        let plaintext = plaintext.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
        Ok(valid)
    }

    /// Create an account; fails with `Conflict` when username or email is taken
    pub async fn create(&self, fields: NewAccount) -> Result<AccountRow> {
        let password_hash = hash_secret(fields.password).await?;

        self.db
            .create_account(CreateAccountRow {
                username: fields.username.trim().to_lowercase(),
                email: fields.email.trim().to_string(),
                full_name: fields.full_name.trim().to_string(),
                password_hash,
                avatar_url: fields.avatar_url,
                cover_image_url: fields.cover_image_url,
            })
            .await
    }

    /// Record `token` as the one live refresh token, or clear it with `None`
    pub async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool> {
        let digest = token.map(hash_token);
        self.db.set_refresh_token(id, digest.as_deref()).await
    }

    /// Replace the live refresh token only if it still equals `presented`
    pub async fn rotate_refresh_token(&self, id: Uuid, presented: &str, next: &str) -> Result<bool> {
        self.db
            .rotate_refresh_token(id, &hash_token(presented), &hash_token(next))
            .await
    }

    pub async fn set_password(&self, id: Uuid, plaintext: &str) -> Result<bool> {
        let password_hash = hash_secret(plaintext.to_string()).await?;
        self.db.set_password_hash(id, &password_hash).await
    }
}

async fn hash_secret(plaintext: String) -> Result<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidora_storage::StorageError;

    fn new_account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Test Account".to_string(),
            password: "correct horse".to_string(),
            avatar_url: None,
            cover_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_hashes_and_normalizes() {
        let store = CredentialStore::new(StorageBackend::in_memory());
        let account = store
            .create(new_account("  Alice ", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(account.username, "alice");
        assert_ne!(account.password_hash, "correct horse");
        assert!(account.password_hash.starts_with("$argon2"));
        assert!(store.verify_secret(&account, "correct horse").await.unwrap());
        assert!(!store.verify_secret(&account, "wrong horse").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let store = CredentialStore::new(StorageBackend::in_memory());
        store
            .create(new_account("alice", "alice@example.com"))
            .await
            .unwrap();

        let dup_username = store.create(new_account("ALICE", "other@example.com")).await;
        assert!(matches!(dup_username, Err(StorageError::Conflict(_))));

        let dup_email = store.create(new_account("bob", "alice@example.com")).await;
        assert!(matches!(dup_email, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_find_by_username_or_email() {
        let store = CredentialStore::new(StorageBackend::in_memory());
        let created = store
            .create(new_account("alice", "alice@example.com"))
            .await
            .unwrap();

        let by_name = store.find_by_username_or_email("Alice").await.unwrap();
        let by_email = store
            .find_by_username_or_email("alice@example.com")
            .await
            .unwrap();

        assert_eq!(by_name.map(|a| a.id), Some(created.id));
        assert_eq!(by_email.map(|a| a.id), Some(created.id));
        assert!(store
            .find_by_username_or_email("nobody")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_refresh_token_stored_as_digest() {
        let store = CredentialStore::new(StorageBackend::in_memory());
        let account = store
            .create(new_account("alice", "alice@example.com"))
            .await
            .unwrap();

        store
            .set_refresh_token(account.id, Some("raw-token"))
            .await
            .unwrap();
        let stored = store.get(account.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, Some(hash_token("raw-token")));

        assert!(!store
            .rotate_refresh_token(account.id, "stale-token", "next")
            .await
            .unwrap());
        assert!(store
            .rotate_refresh_token(account.id, "raw-token", "next")
            .await
            .unwrap());
    }

    #[test]
    fn test_account_view_hides_secrets() {
        let now = Utc::now();
        let row = AccountRow {
            id: Uuid::now_v7(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            avatar_url: None,
            cover_image_url: None,
            refresh_token: Some("digest".to_string()),
            watch_history: vec![],
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(AccountView::from(row)).unwrap();
        assert_eq!(json["fullName"], "Alice");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("refreshToken").is_none());
    }
}
