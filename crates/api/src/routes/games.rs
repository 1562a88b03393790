//! Game endpoint handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::game::{GameDetail, GameResponse, InvitationId, JoinGameRequest};
use domain::services::GameError;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CreateGameMultipart;
use crate::middleware::metrics::{
    record_game_created, record_game_deleted, record_game_failure, record_game_joined,
};

fn failed(operation: &'static str, err: GameError) -> ApiError {
    let err = ApiError::from(err);
    record_game_failure(operation, err.error_code());
    err
}

/// Create a game from a multipart form.
///
/// POST /api/v1/games
pub async fn create_game(
    State(state): State<AppState>,
    CreateGameMultipart { form, thumbnail }: CreateGameMultipart,
) -> Result<Json<GameResponse>, ApiError> {
    let command = form
        .into_command(thumbnail)
        .map_err(|e| failed("create", e))?;
    let format = command.format;

    let created = state
        .workflow
        .create_game(command)
        .await
        .map_err(|e| failed("create", e))?;

    record_game_created(format.as_str(), created.thumbnail.is_some());
    info!(
        invite_id = created.invitation_id,
        reservation_id = created.reservation_id,
        "Game created"
    );
    Ok(Json(GameResponse::created(created.invitation_id)))
}

/// Get a game with a signed thumbnail link.
///
/// GET /api/v1/games/:invite_id
pub async fn get_game(
    State(state): State<AppState>,
    Path(invite_id): Path<InvitationId>,
) -> Result<Json<GameDetail>, ApiError> {
    let detail = state
        .workflow
        .game_detail(invite_id, state.config.assets.url_ttl())
        .await
        .map_err(|e| failed("detail", e))?;
    Ok(Json(detail))
}

/// Delete a game and everything attached to it.
///
/// DELETE /api/v1/games/:invite_id
pub async fn delete_game(
    State(state): State<AppState>,
    Path(invite_id): Path<InvitationId>,
) -> Result<Json<GameResponse>, ApiError> {
    let deleted = state
        .workflow
        .delete_game(invite_id)
        .await
        .map_err(|e| failed("delete", e))?;

    record_game_deleted();
    info!(
        invite_id,
        reservation_id = deleted.reservation_id,
        comments_removed = deleted.comments_removed,
        "Game deleted"
    );
    Ok(Json(GameResponse::ok()))
}

/// Register a user for a game.
///
/// POST /api/v1/games/:invite_id/registrations
pub async fn join_game(
    State(state): State<AppState>,
    Path(invite_id): Path<InvitationId>,
    Json(request): Json<JoinGameRequest>,
) -> Result<Json<GameResponse>, ApiError> {
    if request.user_id < 1 {
        return Err(failed(
            "join",
            GameError::Validation("userID must be positive".to_string()),
        ));
    }

    state
        .workflow
        .join_game(invite_id, request.user_id)
        .await
        .map_err(|e| failed("join", e))?;

    record_game_joined();
    Ok(Json(GameResponse::ok()))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_json, scenario_fields, test_app, MultipartBuilder};
    use axum::{body::Body, http::Request, http::StatusCode};
    use domain::services::{FailPoint, StoreError};
    use tower::ServiceExt;

    fn delete_request(invite_id: i64) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/games/{}", invite_id))
            .body(Body::empty())
            .unwrap()
    }

    fn join_request(invite_id: i64, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/v1/games/{}/registrations", invite_id))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_conflict() {
        let harness = test_app();

        let response = harness
            .app
            .clone()
            .oneshot(scenario_fields(MultipartBuilder::new()).into_request("/api/v1/games"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["inviteId"].as_i64().is_some());

        let response = harness
            .app
            .oneshot(scenario_fields(MultipartBuilder::new()).into_request("/api/v1/games"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Court already booked at given time.");

        let state = harness.store.snapshot().await;
        assert_eq!(state.invitations.len(), 1);
        assert_eq!(state.reservations.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_low_capacity() {
        let harness = test_app();
        let builder = MultipartBuilder::new()
            .text("location", r#"{"address":"123 Main St","postalCode":"V1V1V1","courtNumber":1}"#)
            .text("reservation", r#"{"dateTime":"2030-01-01 10:00"}"#)
            .text("game", r#"{"capacity":"0","type":"doubles"}"#)
            .text("gameInvite", r#"{"title":"Evening Doubles","description":""}"#)
            .text("userID", "7");

        let response = harness
            .app
            .oneshot(builder.into_request("/api/v1/games"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "capacity_too_low");
        assert_eq!(json["message"], "Please ensure Game capacity is at least 1.");
        assert!(harness.store.snapshot().await.invitations.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_past_booking() {
        let harness = test_app();
        let builder = MultipartBuilder::new()
            .text("location", r#"{"address":"123 Main St","postalCode":"V1V1V1","courtNumber":1}"#)
            .text("reservation", r#"{"dateTime":"2001-01-01 10:00"}"#)
            .text("game", r#"{"capacity":2,"type":"singles"}"#)
            .text("gameInvite", r#"{"title":"Morning Singles"}"#)
            .text("userID", "7");

        let response = harness
            .app
            .oneshot(builder.into_request("/api/v1/games"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json["message"],
            "Cannot book for a past date. Please book a different time."
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic_500_and_removes_thumbnail() {
        let harness = test_app();
        harness.store.fail_on(
            FailPoint::InsertCapacityRecord,
            StoreError::Database("disk full".into()),
        );
        let builder = scenario_fields(MultipartBuilder::new()).file(
            "thumbnail",
            "court.png",
            "image/png",
            b"png bytes",
        );

        let response = harness
            .app
            .oneshot(builder.into_request("/api/v1/games"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "An internal error occurred");
        assert!(harness.assets.is_empty());
        assert!(harness.store.snapshot().await.invitations.is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_not_found() {
        let harness = test_app();
        let response = harness
            .app
            .clone()
            .oneshot(scenario_fields(MultipartBuilder::new()).into_request("/api/v1/games"))
            .await
            .unwrap();
        let invite_id = body_json(response).await["inviteId"].as_i64().unwrap();

        let response = harness
            .app
            .clone()
            .oneshot(delete_request(invite_id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);

        let response = harness.app.oneshot(delete_request(invite_id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let state = harness.store.snapshot().await;
        assert!(state.invitations.is_empty());
        assert!(state.reservations.is_empty());
        assert!(state.games.is_empty());
    }

    #[tokio::test]
    async fn test_get_game_detail() {
        let harness = test_app();
        let builder = scenario_fields(MultipartBuilder::new()).file(
            "thumbnail",
            "court.png",
            "image/png",
            b"png bytes",
        );
        let response = harness
            .app
            .clone()
            .oneshot(builder.into_request("/api/v1/games"))
            .await
            .unwrap();
        let invite_id = body_json(response).await["inviteId"].as_i64().unwrap();

        let response = harness
            .app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/games/{}", invite_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["title"], "Evening Doubles");
        assert_eq!(json["format"], "doubles");
        assert_eq!(json["capacity"], 4);
        assert_eq!(json["currentlyEnrolled"], 1);
        assert_eq!(json["thumbnailAlt"], "court.png");
        assert!(json["thumbnailUrl"]
            .as_str()
            .unwrap()
            .contains("/api/v1/assets/"));
    }

    #[tokio::test]
    async fn test_join_until_full() {
        let harness = test_app();
        let builder = MultipartBuilder::new()
            .text("location", r#"{"address":"123 Main St","postalCode":"V1V1V1","courtNumber":2}"#)
            .text("reservation", r#"{"dateTime":"2030-01-01 10:00"}"#)
            .text("game", r#"{"capacity":2,"type":"singles"}"#)
            .text("gameInvite", r#"{"title":"Singles"}"#)
            .text("userID", "7");
        let response = harness
            .app
            .clone()
            .oneshot(builder.into_request("/api/v1/games"))
            .await
            .unwrap();
        let invite_id = body_json(response).await["inviteId"].as_i64().unwrap();

        let response = harness
            .app
            .clone()
            .oneshot(join_request(invite_id, r#"{"userID": 8}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = harness
            .app
            .clone()
            .oneshot(join_request(invite_id, r#"{"userID": "9"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["message"], "Game is already full.");

        let response = harness
            .app
            .oneshot(join_request(invite_id + 100, r#"{"userID": 9}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
