//! Social graph service
//!
//! Follow and like toggles. The acting user always comes from the
//! authenticated identity; identity fields in request bodies are only
//! checked against it.

use std::sync::Arc;

use crate::data::{Database, FollowSets, LikeState};
use crate::error::AppError;
use crate::metrics::record_toggle;

/// Result of a follow toggle
#[derive(Debug, Clone)]
pub struct FollowOutcome {
    /// Whether the follower follows the target after the toggle
    pub following: bool,
    pub follower_id: String,
    pub follower: FollowSets,
    pub following_id: String,
    pub target: FollowSets,
}

/// A client-supplied identity must match the authenticated one.
fn ensure_actor(actor_id: &str, claimed: Option<&str>) -> Result<(), AppError> {
    match claimed {
        Some(claimed) if claimed != actor_id => {
            tracing::debug!(actor_id, claimed, "Rejected identity mismatch");
            Err(AppError::Forbidden)
        }
        _ => Ok(()),
    }
}

/// Social graph service
pub struct SocialService {
    db: Arc<Database>,
}

impl SocialService {
    /// Create new social service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Toggle `actor_id -> following_id`
    ///
    /// # Errors
    /// - `Forbidden` if `claimed_follower` is present and not the actor
    /// - `Validation` for a self-follow
    /// - `NotFound` if either user is missing
    pub async fn follow(
        &self,
        actor_id: &str,
        claimed_follower: Option<&str>,
        following_id: &str,
    ) -> Result<FollowOutcome, AppError> {
        ensure_actor(actor_id, claimed_follower)?;

        let following = self.db.toggle_follow(actor_id, following_id).await?;
        record_toggle("follow", following);
        tracing::info!(
            follower_id = %actor_id,
            following_id = %following_id,
            following,
            "Follow toggled"
        );

        let ids = [actor_id.to_string(), following_id.to_string()];
        let mut sets = self.db.get_follow_sets_batch(&ids).await?;

        Ok(FollowOutcome {
            following,
            follower_id: actor_id.to_string(),
            follower: sets.remove(actor_id).unwrap_or_default(),
            following_id: following_id.to_string(),
            target: sets.remove(following_id).unwrap_or_default(),
        })
    }

    /// Toggle the actor's like on a review
    pub async fn like_review(
        &self,
        actor_id: &str,
        claimed_user: Option<&str>,
        review_id: &str,
    ) -> Result<LikeState, AppError> {
        ensure_actor(actor_id, claimed_user)?;

        let state = self.db.toggle_review_like(review_id, actor_id).await?;
        record_toggle("review_like", state.liked);
        tracing::debug!(review_id, user_id = %actor_id, liked = state.liked, "Review like toggled");

        Ok(state)
    }

    /// Toggle the actor's like on a comment
    pub async fn like_comment(
        &self,
        actor_id: &str,
        claimed_user: Option<&str>,
        comment_id: &str,
    ) -> Result<LikeState, AppError> {
        ensure_actor(actor_id, claimed_user)?;

        let state = self.db.toggle_comment_like(comment_id, actor_id).await?;
        record_toggle("comment_like", state.liked);
        tracing::debug!(comment_id, user_id = %actor_id, liked = state.liked, "Comment like toggled");

        Ok(state)
    }
}
