// Video service: publishing, reads and owner-only mutations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vidora_storage::{CreateVideoRow, StorageBackend, UpdateVideo, VideoRow};

use crate::api::validation::{
    max_len, required, validate_url, MAX_VIDEO_DESCRIPTION_BYTES, MAX_VIDEO_TITLE_BYTES,
};
use crate::api::videos::{PublishVideoRequest, UpdateVideoRequest};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub description: String,
    /// Length in seconds
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            title: row.title,
            description: row.description,
            duration: row.duration,
            views: row.views,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct VideoService {
    db: StorageBackend,
}

impl VideoService {
    pub fn new(db: StorageBackend) -> Self {
        Self { db }
    }

    pub async fn publish(&self, owner_id: Uuid, req: PublishVideoRequest) -> Result<Video, ApiError> {
        let title = required("title", req.title.as_deref())?;
        let description = required("description", req.description.as_deref())?;
        let video_url = required("videoUrl", req.video_url.as_deref())?;
        max_len("title", title, MAX_VIDEO_TITLE_BYTES)?;
        max_len("description", description, MAX_VIDEO_DESCRIPTION_BYTES)?;
        validate_url("videoUrl", video_url)?;

        let thumbnail_url = optional_url("thumbnailUrl", req.thumbnail_url.as_deref())?;
        let duration = req.duration.unwrap_or(0.0);
        if !duration.is_finite() || duration < 0.0 {
            return Err(ApiError::validation("duration must be a non-negative number"));
        }

        let row = self
            .db
            .create_video(CreateVideoRow {
                owner_id,
                video_url: video_url.to_string(),
                thumbnail_url,
                title: title.to_string(),
                description: description.to_string(),
                duration,
            })
            .await?;

        tracing::info!(video_id = %row.id, owner_id = %owner_id, "Video published");
        Ok(row.into())
    }

    /// Fetch a video and record the view against the viewer's history.
    /// Unpublished videos are visible to their owner only.
    pub async fn get(&self, video_id: Uuid, viewer_id: Uuid) -> Result<Video, ApiError> {
        let mut row = self
            .db
            .get_video(video_id)
            .await?
            .filter(|v| v.is_published || v.owner_id == viewer_id)
            .ok_or_else(|| ApiError::not_found("Video not found"))?;

        if self.db.record_video_view(video_id, viewer_id).await? {
            row.views += 1;
        }
        Ok(row.into())
    }

    pub async fn update(
        &self,
        video_id: Uuid,
        caller_id: Uuid,
        req: UpdateVideoRequest,
    ) -> Result<Video, ApiError> {
        self.owned(video_id, caller_id).await?;

        let title = optional_text("title", req.title.as_deref(), MAX_VIDEO_TITLE_BYTES)?;
        let description = optional_text(
            "description",
            req.description.as_deref(),
            MAX_VIDEO_DESCRIPTION_BYTES,
        )?;
        let thumbnail_url = optional_url("thumbnailUrl", req.thumbnail_url.as_deref())?;
        if title.is_none() && description.is_none() && thumbnail_url.is_none() {
            return Err(ApiError::validation("Nothing to update"));
        }

        let row = self
            .db
            .update_video(
                video_id,
                UpdateVideo {
                    title,
                    description,
                    thumbnail_url,
                },
            )
            .await?
            .ok_or_else(|| ApiError::not_found("Video not found"))?;
        Ok(row.into())
    }

    pub async fn delete(&self, video_id: Uuid, caller_id: Uuid) -> Result<(), ApiError> {
        self.owned(video_id, caller_id).await?;
        if !self.db.delete_video(video_id).await? {
            return Err(ApiError::not_found("Video not found"));
        }
        tracing::info!(video_id = %video_id, "Video deleted");
        Ok(())
    }

    pub async fn toggle_publish_status(
        &self,
        video_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Video, ApiError> {
        let current = self.owned(video_id, caller_id).await?;
        let row = self
            .db
            .set_video_published(video_id, !current.is_published)
            .await?
            .ok_or_else(|| ApiError::not_found("Video not found"))?;
        Ok(row.into())
    }

    /// Load a video the caller owns
    async fn owned(&self, video_id: Uuid, caller_id: Uuid) -> Result<VideoRow, ApiError> {
        let row = self
            .db
            .get_video(video_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Video not found"))?;
        if row.owner_id != caller_id {
            return Err(ApiError::forbidden("Only the owner can modify this video"));
        }
        Ok(row)
    }
}

fn optional_text(field: &str, value: Option<&str>, limit: usize) -> Result<Option<String>, ApiError> {
    match value.map(str::trim) {
        None => Ok(None),
        Some("") => Err(ApiError::validation(format!("{} cannot be blank", field))),
        Some(v) => {
            max_len(field, v, limit)?;
            Ok(Some(v.to_string()))
        }
    }
}

fn optional_url(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
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
    use vidora_storage::CreateAccountRow;

    async fn account(db: &StorageBackend, username: &str) -> Uuid {
        db.create_account(CreateAccountRow {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            full_name: username.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            avatar_url: None,
            cover_image_url: None,
        })
        .await
        .unwrap()
        .id
    }

    fn publish_request(title: &str) -> PublishVideoRequest {
        PublishVideoRequest {
            title: Some(title.to_string()),
            description: Some("about things".to_string()),
            video_url: Some("https://cdn.example.com/v.mp4".to_string()),
            thumbnail_url: Some("https://cdn.example.com/v.png".to_string()),
            duration: Some(42.0),
        }
    }

    #[tokio::test]
    async fn test_publish_validation() {
        let db = StorageBackend::in_memory();
        let owner = account(&db, "alice").await;
        let service = VideoService::new(db);

        let mut missing_title = publish_request("x");
        missing_title.title = Some(" ".to_string());
        assert!(matches!(
            service.publish(owner, missing_title).await,
            Err(ApiError::ValidationFailed(_))
        ));

        let mut negative = publish_request("x");
        negative.duration = Some(-1.0);
        assert!(matches!(
            service.publish(owner, negative).await,
            Err(ApiError::ValidationFailed(_))
        ));

        let video = service.publish(owner, publish_request("ok")).await.unwrap();
        assert!(video.is_published);
        assert_eq!(video.owner_id, owner);
        assert_eq!(video.views, 0);
    }

    #[tokio::test]
    async fn test_get_records_view() {
        let db = StorageBackend::in_memory();
        let owner = account(&db, "alice").await;
        let viewer = account(&db, "bob").await;
        let service = VideoService::new(db.clone());
        let video = service.publish(owner, publish_request("ok")).await.unwrap();

        let seen = service.get(video.id, viewer).await.unwrap();
        assert_eq!(seen.views, 1);

        let history = db.get_watch_history(viewer).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].video.id, video.id);
    }

    #[tokio::test]
    async fn test_unpublished_visible_to_owner_only() {
        let db = StorageBackend::in_memory();
        let owner = account(&db, "alice").await;
        let viewer = account(&db, "bob").await;
        let service = VideoService::new(db);
        let video = service.publish(owner, publish_request("ok")).await.unwrap();

        let toggled = service.toggle_publish_status(video.id, owner).await.unwrap();
        assert!(!toggled.is_published);

        assert!(matches!(
            service.get(video.id, viewer).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(service.get(video.id, owner).await.is_ok());

        let again = service.toggle_publish_status(video.id, owner).await.unwrap();
        assert!(again.is_published);
    }

    #[tokio::test]
    async fn test_owner_only_mutations() {
        let db = StorageBackend::in_memory();
        let owner = account(&db, "alice").await;
        let other = account(&db, "bob").await;
        let service = VideoService::new(db);
        let video = service.publish(owner, publish_request("ok")).await.unwrap();

        let update = UpdateVideoRequest {
            title: Some("renamed".to_string()),
            description: None,
            thumbnail_url: None,
        };
        assert!(matches!(
            service.update(video.id, other, update.clone()).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(video.id, other).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            service.toggle_publish_status(video.id, other).await,
            Err(ApiError::Forbidden(_))
        ));

        let updated = service.update(video.id, owner, update).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description, "about things");

        service.delete(video.id, owner).await.unwrap();
        assert!(matches!(
            service.get(video.id, owner).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let db = StorageBackend::in_memory();
        let owner = account(&db, "alice").await;
        let service = VideoService::new(db);
        let video = service.publish(owner, publish_request("ok")).await.unwrap();

        let result = service
            .update(
                video.id,
                owner,
                UpdateVideoRequest {
                    title: None,
                    description: None,
                    thumbnail_url: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::ValidationFailed(_))));
    }
}
