//! Multipart create-game form extractor.

use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use domain::models::{AssetUpload, CreateGameForm};
use tracing::debug;

use crate::error::ApiError;

/// Form field carrying the optional thumbnail file.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// A create-game request: the typed form plus the optional thumbnail.
#[derive(Debug)]
pub struct CreateGameMultipart {
    pub form: CreateGameForm,
    pub thumbnail: Option<AssetUpload>,
}

#[derive(Default)]
struct RawFields {
    location: Option<String>,
    reservation: Option<String>,
    game: Option<String>,
    game_invite: Option<String>,
    user_id: Option<String>,
}

#[async_trait]
impl<S> FromRequest<S> for CreateGameMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;

        let mut raw = RawFields::default();
        let mut thumbnail = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                THUMBNAIL_FIELD => {
                    let alt_text = field.file_name().unwrap_or_default().to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if !bytes.is_empty() {
                        thumbnail = Some(AssetUpload {
                            bytes: bytes.to_vec(),
                            content_type,
                            alt_text,
                        });
                    }
                }
                "location" => raw.location = Some(field.text().await?),
                "reservation" => raw.reservation = Some(field.text().await?),
                "game" => raw.game = Some(field.text().await?),
                "gameInvite" => raw.game_invite = Some(field.text().await?),
                "userID" => raw.user_id = Some(field.text().await?),
                other => debug!(field = other, "Ignoring unknown form field"),
            }
        }

        let form = CreateGameForm::from_fields(
            raw.location.as_deref(),
            raw.reservation.as_deref(),
            raw.game.as_deref(),
            raw.game_invite.as_deref(),
            raw.user_id.as_deref(),
        )?;

        Ok(Self { form, thumbnail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{scenario_fields, MultipartBuilder};
    use domain::models::GameFormat;

    async fn extract(builder: MultipartBuilder) -> Result<CreateGameMultipart, ApiError> {
        CreateGameMultipart::from_request(builder.into_request("/"), &()).await
    }

    #[tokio::test]
    async fn test_extracts_text_fields() {
        let builder = scenario_fields(MultipartBuilder::new());
        let extracted = extract(builder).await.unwrap();

        assert!(extracted.thumbnail.is_none());
        assert_eq!(extracted.form.user_id, 7);
        assert_eq!(extracted.form.game.format, GameFormat::Doubles);
        assert_eq!(extracted.form.location.address, "123 Main St");
    }

    #[tokio::test]
    async fn test_thumbnail_alt_text_is_file_name() {
        let builder = scenario_fields(MultipartBuilder::new()).file(
            THUMBNAIL_FIELD,
            "court.png",
            "image/png",
            b"not really a png",
        );
        let extracted = extract(builder).await.unwrap();

        let thumbnail = extracted.thumbnail.unwrap();
        assert_eq!(thumbnail.alt_text, "court.png");
        assert_eq!(thumbnail.content_type, "image/png");
        assert_eq!(thumbnail.bytes, b"not really a png");
    }

    #[tokio::test]
    async fn test_empty_thumbnail_part_is_ignored() {
        let builder =
            scenario_fields(MultipartBuilder::new()).file(THUMBNAIL_FIELD, "", "image/png", b"");
        let extracted = extract(builder).await.unwrap();
        assert!(extracted.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let builder = MultipartBuilder::new()
            .text("location", r#"{"address":"123 Main St","postalCode":"V1V1V1","courtNumber":1}"#)
            .text("userID", "7");
        let err = extract(builder).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("reservation")));
    }

    #[tokio::test]
    async fn test_non_multipart_body_rejected() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{}"))
            .unwrap();
        let err = CreateGameMultipart::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
