//! Game invitations and the rows hanging off them.

use tracing::{debug, warn};

use super::error::GameError;
use super::store::{GameSession, InvitationDependents, NewInvitation, StoreError};
use crate::models::{AssetKey, InvitationId, UserId};

/// Thumbnail reference recorded alongside an invitation.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailRef<'a> {
    pub key: &'a AssetKey,
    pub alt_text: &'a str,
}

/// Creates and removes game invitations inside a workflow session.
pub struct InvitationRegistry;

impl InvitationRegistry {
    /// Records the thumbnail (when present) and the invitation that points at
    /// it. Returns the new invitation id.
    pub async fn create(
        session: &mut dyn GameSession,
        title: &str,
        description: &str,
        thumbnail: Option<ThumbnailRef<'_>>,
        creator: UserId,
    ) -> Result<InvitationId, GameError> {
        if let Some(thumb) = thumbnail {
            let rows = session
                .insert_picture(thumb.key, thumb.alt_text)
                .await
                .map_err(insert_error)?;
            if rows == 0 {
                return Err(GameError::InsertFailed(
                    "Picture was not inserted".to_string(),
                ));
            }
        }

        let invitation = NewInvitation {
            title: title.to_string(),
            description: description.to_string(),
            thumbnail: thumbnail.map(|t| t.key.clone()),
            creator,
        };

        match session.insert_invitation(&invitation).await {
            Ok(Some(id)) => {
                debug!(invitation_id = id, creator, "Invitation created");
                Ok(id)
            }
            Ok(None) => Err(GameError::InsertFailed(
                "GameInvite was not inserted".to_string(),
            )),
            Err(StoreError::ForeignKeyViolation(_)) => Err(GameError::NotFound(format!(
                "User {creator} doesn't exist."
            ))),
            Err(e) => Err(insert_error(e)),
        }
    }

    /// Removes an invitation together with its picture row and comments.
    ///
    /// Returns what was attached to it so the caller can drop the stored
    /// thumbnail object once the transaction commits. Dependent rows that are
    /// already gone are tolerated.
    pub async fn delete(
        session: &mut dyn GameSession,
        invitation_id: InvitationId,
    ) -> Result<InvitationDependents, GameError> {
        let dependents = session
            .find_invitation_dependents(invitation_id)
            .await?
            .ok_or_else(|| {
                GameError::NotFound(format!("GameInvite {invitation_id} doesn't exist."))
            })?;

        let rows = session.delete_invitation(invitation_id).await?;
        if rows == 0 {
            return Err(GameError::NotFound(format!(
                "GameInvite {invitation_id} doesn't exist."
            )));
        }

        if let Some(key) = &dependents.thumbnail {
            if session.delete_picture(key).await? == 0 {
                warn!(invitation_id, key = %key, "Picture row already removed");
            }
        }

        if !dependents.comment_ids.is_empty() {
            let deleted = session.delete_comments(&dependents.comment_ids).await?;
            if deleted < dependents.comment_ids.len() as u64 {
                warn!(
                    invitation_id,
                    expected = dependents.comment_ids.len(),
                    deleted,
                    "Some comments were already removed"
                );
            }
        }

        debug!(invitation_id, "Invitation deleted");
        Ok(dependents)
    }
}

fn insert_error(err: StoreError) -> GameError {
    match err {
        StoreError::Unavailable(msg) => GameError::StorageUnavailable(msg),
        other => GameError::InsertFailed(other.to_string()),
    }
}
