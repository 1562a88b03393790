//! Game creation and deletion workflows.
//!
//! Creation spans two stores: the thumbnail is uploaded to the asset store
//! before the relational transaction opens, so a failure after the upload is
//! compensated by deleting the asset. Deletion touches only the relational
//! store inside one transaction; the thumbnail object is removed after commit.

use chrono::Utc;
use metrics::counter;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::asset_store::AssetStore;
use super::capacity_record::CapacityRecord;
use super::error::GameError;
use super::invitation_registry::{InvitationRegistry, ThumbnailRef};
use super::reservation_ledger::ReservationLedger;
use super::store::{GameSession, GameStore};
use crate::models::{
    AssetKey, CreateGameCommand, GameDetail, InvitationId, ReservationId, UserId,
};

/// Identifiers produced by a successful creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGame {
    pub invitation_id: InvitationId,
    pub reservation_id: ReservationId,
    pub thumbnail: Option<AssetKey>,
}

/// What a successful deletion removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedGame {
    pub invitation_id: InvitationId,
    pub reservation_id: ReservationId,
    pub thumbnail: Option<AssetKey>,
    pub comments_removed: usize,
}

/// Where the relational part of a creation failed.
///
/// A failed commit may still have been applied, so the thumbnail is only
/// compensated once the game is known to be absent.
enum RecordsFailure {
    Step(GameError),
    Commit {
        invitation_id: InvitationId,
        reservation_id: ReservationId,
        error: GameError,
    },
}

impl From<GameError> for RecordsFailure {
    fn from(err: GameError) -> Self {
        RecordsFailure::Step(err)
    }
}

/// Orchestrates the game components over one session per call.
#[derive(Clone)]
pub struct GameWorkflow {
    store: Arc<dyn GameStore>,
    assets: Arc<dyn AssetStore>,
    operation_timeout: Duration,
}

impl GameWorkflow {
    pub fn new(
        store: Arc<dyn GameStore>,
        assets: Arc<dyn AssetStore>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            store,
            assets,
            operation_timeout,
        }
    }

    pub fn assets(&self) -> &Arc<dyn AssetStore> {
        &self.assets
    }

    /// Creates a game: thumbnail, invitation, reservation, capacity record.
    ///
    /// Nothing is committed unless every step succeeds. When a later step
    /// fails after the thumbnail was uploaded, the thumbnail is deleted before
    /// the original error is returned. If the commit itself fails, the game is
    /// looked up first: a game that did land is reported as created, and the
    /// thumbnail is kept when the lookup cannot tell.
    #[instrument(skip(self, command), fields(format = %command.format, creator = command.creator))]
    pub async fn create_game(
        &self,
        mut command: CreateGameCommand,
    ) -> Result<CreatedGame, GameError> {
        let now = Utc::now();
        if command.capacity < 1 {
            return Err(GameError::CapacityTooLow);
        }
        if command.booking_time <= now {
            return Err(GameError::InvalidTime);
        }

        let thumbnail = match command.thumbnail.take() {
            Some(upload) => {
                let alt_text = upload.alt_text.clone();
                let key = self
                    .bounded("asset upload", async {
                        self.assets.store(upload).await.map_err(GameError::from)
                    })
                    .await?;
                Some((key, alt_text))
            }
            None => None,
        };

        let thumb_ref = thumbnail.as_ref().map(|(key, alt_text)| ThumbnailRef {
            key,
            alt_text: alt_text.as_str(),
        });

        let failure = match self.create_records(&command, thumb_ref).await {
            Ok((invitation_id, reservation_id)) => {
                info!(invitation_id, reservation_id, "Game created");
                return Ok(CreatedGame {
                    invitation_id,
                    reservation_id,
                    thumbnail: thumbnail.map(|(key, _)| key),
                });
            }
            Err(failure) => failure,
        };

        match failure {
            RecordsFailure::Step(err) => {
                if let Some((key, _)) = &thumbnail {
                    self.compensate(key, &err).await;
                }
                Err(err)
            }
            RecordsFailure::Commit {
                invitation_id,
                reservation_id,
                error: err,
            } => match self.committed(invitation_id).await {
                Some(true) => {
                    warn!(
                        invitation_id,
                        reservation_id,
                        error = %err,
                        "Commit reported failure but the game exists"
                    );
                    Ok(CreatedGame {
                        invitation_id,
                        reservation_id,
                        thumbnail: thumbnail.map(|(key, _)| key),
                    })
                }
                Some(false) => {
                    if let Some((key, _)) = &thumbnail {
                        self.compensate(key, &err).await;
                    }
                    Err(err)
                }
                None => {
                    if let Some((key, _)) = &thumbnail {
                        error!(
                            invitation_id,
                            key = %key,
                            error = %err,
                            "Commit outcome unknown, keeping thumbnail"
                        );
                        counter!("game_compensations_total", "outcome" => "skipped")
                            .increment(1);
                    }
                    Err(err)
                }
            },
        }
    }

    async fn create_records(
        &self,
        command: &CreateGameCommand,
        thumbnail: Option<ThumbnailRef<'_>>,
    ) -> Result<(InvitationId, ReservationId), RecordsFailure> {
        let mut session = self.begin().await?;

        let invitation_id = self
            .bounded(
                "invitation create",
                InvitationRegistry::create(
                    session.as_mut(),
                    &command.title,
                    &command.description,
                    thumbnail,
                    command.creator,
                ),
            )
            .await?;

        let reservation_id = self
            .bounded(
                "reservation create",
                ReservationLedger::create(
                    session.as_mut(),
                    &command.court,
                    command.booking_time,
                    Utc::now(),
                ),
            )
            .await?;

        let is_active = command.booking_time > Utc::now();
        self.bounded(
            "capacity record create",
            CapacityRecord::create(
                session.as_mut(),
                reservation_id,
                invitation_id,
                command.capacity,
                command.format,
                is_active,
            ),
        )
        .await?;

        self.commit(session)
            .await
            .map_err(|error| RecordsFailure::Commit {
                invitation_id,
                reservation_id,
                error,
            })?;
        Ok((invitation_id, reservation_id))
    }

    /// Whether a game whose commit failed is visible anyway. `None` when the
    /// store cannot answer.
    async fn committed(&self, invitation_id: InvitationId) -> Option<bool> {
        let found = self
            .bounded("commit check", async {
                self.store
                    .find_game(invitation_id)
                    .await
                    .map_err(GameError::from)
            })
            .await;
        match found {
            Ok(record) => Some(record.is_some()),
            Err(e) => {
                error!(invitation_id, error = %e, "Could not check whether the game was committed");
                None
            }
        }
    }

    /// Deletes a game and everything hanging off its invitation.
    ///
    /// All row deletions share one transaction; any failure leaves the game
    /// untouched.
    #[instrument(skip(self))]
    pub async fn delete_game(&self, invitation_id: InvitationId) -> Result<DeletedGame, GameError> {
        let mut session = self.begin().await?;

        let reservation_id = self
            .bounded(
                "capacity record lookup",
                CapacityRecord::find_reservation_id(session.as_mut(), invitation_id),
            )
            .await?;

        self.bounded(
            "capacity record delete",
            CapacityRecord::delete(session.as_mut(), invitation_id),
        )
        .await?;

        self.bounded(
            "reservation delete",
            ReservationLedger::delete(session.as_mut(), reservation_id),
        )
        .await?;

        let dependents = self
            .bounded(
                "invitation delete",
                InvitationRegistry::delete(session.as_mut(), invitation_id),
            )
            .await?;

        self.commit(session).await?;

        if let Some(key) = &dependents.thumbnail {
            self.remove_asset(key).await;
        }

        info!(
            invitation_id,
            reservation_id,
            comments_removed = dependents.comment_ids.len(),
            "Game deleted"
        );

        Ok(DeletedGame {
            invitation_id,
            reservation_id,
            comments_removed: dependents.comment_ids.len(),
            thumbnail: dependents.thumbnail,
        })
    }

    /// Registers `user_id` for a game, taking one seat.
    #[instrument(skip(self))]
    pub async fn join_game(
        &self,
        invitation_id: InvitationId,
        user_id: UserId,
    ) -> Result<(), GameError> {
        let mut session = self.begin().await?;
        self.bounded(
            "enroll",
            CapacityRecord::enroll(session.as_mut(), invitation_id, user_id),
        )
        .await?;
        self.commit(session).await?;

        info!(invitation_id, user_id, "User joined game");
        Ok(())
    }

    /// Reads a game with a signed thumbnail URL valid for `url_ttl`.
    pub async fn game_detail(
        &self,
        invitation_id: InvitationId,
        url_ttl: Duration,
    ) -> Result<GameDetail, GameError> {
        let record = self
            .bounded("game lookup", async {
                self.store
                    .find_game(invitation_id)
                    .await
                    .map_err(GameError::from)
            })
            .await?
            .ok_or(GameError::GameNotFound)?;

        let thumbnail_url = match &record.thumbnail {
            Some(key) => {
                let url = self
                    .bounded("asset url", async {
                        self.assets
                            .issue_access_url(key, url_ttl)
                            .await
                            .map_err(GameError::from)
                    })
                    .await;
                match url {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!(invitation_id, key = %key, error = %e, "Thumbnail URL unavailable");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(GameDetail {
            invite_id: record.invitation_id,
            title: record.title,
            description: record.description,
            status: record.status,
            creator: record.creator,
            format: record.format,
            capacity: record.capacity,
            currently_enrolled: record.currently_enrolled,
            is_active: record.is_active,
            booking_time: record.booking_time,
            court: record.court,
            thumbnail_url,
            thumbnail_alt: record.thumbnail_alt,
        })
    }

    async fn begin(&self) -> Result<Box<dyn GameSession>, GameError> {
        self.bounded("begin", async {
            self.store.begin().await.map_err(GameError::from)
        })
        .await
    }

    async fn commit(&self, session: Box<dyn GameSession>) -> Result<(), GameError> {
        self.bounded("commit", async move {
            session.commit().await.map_err(GameError::from)
        })
        .await
    }

    /// Runs one external call under the operation timeout.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, GameError>
    where
        F: Future<Output = Result<T, GameError>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = self.operation_timeout.as_millis() as u64, "Operation timed out");
                Err(GameError::StorageUnavailable(format!(
                    "{operation} timed out"
                )))
            }
        }
    }

    async fn compensate(&self, key: &AssetKey, cause: &GameError) {
        warn!(key = %key, error = %cause, "Game creation failed, removing uploaded thumbnail");
        let outcome = if self.delete_asset(key).await {
            "success"
        } else {
            "failure"
        };
        counter!("game_compensations_total", "outcome" => outcome).increment(1);
    }

    async fn remove_asset(&self, key: &AssetKey) {
        if !self.delete_asset(key).await {
            warn!(key = %key, "Thumbnail left behind after game deletion");
        }
    }

    async fn delete_asset(&self, key: &AssetKey) -> bool {
        match tokio::time::timeout(self.operation_timeout, self.assets.delete(key)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!(key = %key, error = %e, "Failed to delete thumbnail");
                false
            }
            Err(_) => {
                error!(key = %key, "Timed out deleting thumbnail");
                false
            }
        }
    }
}
