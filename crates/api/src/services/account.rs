// Account service: registration and profile updates

use uuid::Uuid;
use vidora_storage::{StorageBackend, UpdateAccount};

use crate::api::users::{RegisterRequest, UpdateAccountRequest};
use crate::api::validation::{
    max_len, required, required_secret, validate_email, validate_url, validate_username,
    MAX_FULL_NAME_BYTES, MAX_PASSWORD_BYTES,
};
use crate::auth::credentials::{AccountView, CredentialStore, NewAccount};
use crate::error::ApiError;

#[derive(Clone)]
pub struct AccountService {
    db: StorageBackend,
    credentials: CredentialStore,
}

impl AccountService {
    pub fn new(db: StorageBackend, credentials: CredentialStore) -> Self {
        Self { db, credentials }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AccountView, ApiError> {
        let username = required("username", req.username.as_deref())?;
        let email = required("email", req.email.as_deref())?;
        let full_name = required("fullName", req.full_name.as_deref())?;
        let password = required_secret("password", req.password.as_deref())?;
        validate_username(username)?;
        validate_email(email)?;
        max_len("fullName", full_name, MAX_FULL_NAME_BYTES)?;
        max_len("password", password, MAX_PASSWORD_BYTES)?;

        let avatar_url = optional_url("avatarUrl", req.avatar_url)?;
        let cover_image_url = optional_url("coverImageUrl", req.cover_image_url)?;

        let row = self
            .credentials
            .create(NewAccount {
                username: username.to_string(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                password: password.to_string(),
                avatar_url,
                cover_image_url,
            })
            .await?;

        tracing::info!(account_id = %row.id, username = %row.username, "Account registered");
        Ok(row.into())
    }

    /// Full name and email are both required
    pub async fn update_details(
        &self,
        account_id: Uuid,
        req: UpdateAccountRequest,
    ) -> Result<AccountView, ApiError> {
        let full_name = required("fullName", req.full_name.as_deref())?;
        let email = required("email", req.email.as_deref())?;
        max_len("fullName", full_name, MAX_FULL_NAME_BYTES)?;
        validate_email(email)?;

        self.apply(
            account_id,
            UpdateAccount {
                full_name: Some(full_name.to_string()),
                email: Some(email.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_avatar(
        &self,
        account_id: Uuid,
        url: Option<&str>,
    ) -> Result<AccountView, ApiError> {
        let url = required("avatarUrl", url)?;
        validate_url("avatarUrl", url)?;
        self.apply(
            account_id,
            UpdateAccount {
                avatar_url: Some(url.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_cover_image(
        &self,
        account_id: Uuid,
        url: Option<&str>,
    ) -> Result<AccountView, ApiError> {
        let url = required("coverImageUrl", url)?;
        validate_url("coverImageUrl", url)?;
        self.apply(
            account_id,
            UpdateAccount {
                cover_image_url: Some(url.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    async fn apply(&self, account_id: Uuid, input: UpdateAccount) -> Result<AccountView, ApiError> {
        self.db
            .update_account(account_id, input)
            .await?
            .map(AccountView::from)
            .ok_or_else(|| ApiError::not_found("User does not exist"))
    }
}

fn optional_url(field: &str, value: Option<String>) -> Result<Option<String>, ApiError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => {
            validate_url(field, v)?;
            Ok(Some(v.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AccountService {
        let db = StorageBackend::in_memory();
        AccountService::new(db.clone(), CredentialStore::new(db))
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            full_name: Some("Alice Example".to_string()),
            password: Some("password123".to_string()),
            avatar_url: Some("https://cdn.example.com/a.png".to_string()),
            cover_image_url: None,
        }
    }

    #[tokio::test]
    async fn test_register() {
        let service = service();
        let view = service
            .register(register_request("Alice", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(view.username, "alice");
        assert_eq!(view.avatar_url.as_deref(), Some("https://cdn.example.com/a.png"));
        let stored = service.credentials.get(view.id).await.unwrap().unwrap();
        assert_eq!(AccountView::from(stored), view);
    }

    #[tokio::test]
    async fn test_register_keeps_password_whitespace() {
        let service = service();
        let mut req = register_request("alice", "alice@example.com");
        req.password = Some(" password123 ".to_string());
        let view = service.register(req).await.unwrap();

        let row = service.credentials.get(view.id).await.unwrap().unwrap();
        assert!(service
            .credentials
            .verify_secret(&row, " password123 ")
            .await
            .unwrap());
        assert!(!service
            .credentials
            .verify_secret(&row, "password123")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let service = service();

        let mut missing = register_request("alice", "alice@example.com");
        missing.full_name = None;
        assert!(matches!(
            service.register(missing).await,
            Err(ApiError::ValidationFailed(_))
        ));

        assert!(matches!(
            service.register(register_request("alice", "not-an-email")).await,
            Err(ApiError::ValidationFailed(_))
        ));

        service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            service
                .register(register_request("alice", "other@example.com"))
                .await,
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            service
                .register(register_request("bob", "alice@example.com"))
                .await,
            Err(ApiError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_details_requires_both_fields() {
        let service = service();
        let view = service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        let partial = UpdateAccountRequest {
            full_name: Some("New Name".to_string()),
            email: None,
        };
        assert!(matches!(
            service.update_details(view.id, partial).await,
            Err(ApiError::ValidationFailed(_))
        ));

        let updated = service
            .update_details(
                view.id,
                UpdateAccountRequest {
                    full_name: Some("New Name".to_string()),
                    email: Some("new@example.com".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "New Name");
        assert_eq!(updated.email, "new@example.com");
    }

    #[tokio::test]
    async fn test_update_images() {
        let service = service();
        let view = service
            .register(register_request("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(matches!(
            service.update_avatar(view.id, Some("  ")).await,
            Err(ApiError::ValidationFailed(_))
        ));

        let updated = service
            .update_cover_image(view.id, Some("https://cdn.example.com/cover.png"))
            .await
            .unwrap();
        assert_eq!(
            updated.cover_image_url.as_deref(),
            Some("https://cdn.example.com/cover.png")
        );
        assert_eq!(
            updated.avatar_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }
}
