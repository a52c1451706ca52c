//! Review service
//!
//! Handles reviews and their comments. Ownership is assigned from the
//! authenticated user and checked on every edit or delete.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Comment, Database, EntityId, Review, ReviewPatch};
use crate::error::AppError;
use crate::metrics::REVIEWS_CREATED_TOTAL;

/// A review with its like set and comment IDs
#[derive(Debug, Clone)]
pub struct ReviewDetails {
    pub review: Review,
    pub likes: Vec<String>,
    pub comments: Vec<String>,
}

/// A comment with its like set
#[derive(Debug, Clone)]
pub struct CommentDetails {
    pub comment: Comment,
    pub likes: Vec<String>,
}

/// Fields accepted when creating a review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub title: String,
    pub body: Option<String>,
    pub classification: f64,
    /// Movie ID
    pub content: String,
}

fn check_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn check_classification(classification: f64) -> Result<f64, AppError> {
    if !classification.is_finite() {
        return Err(AppError::Validation(
            "classification must be a finite number".to_string(),
        ));
    }
    Ok(classification)
}

/// Review service
pub struct ReviewService {
    db: Arc<Database>,
}

impl ReviewService {
    /// Create new review service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a review owned by `owner_id`
    ///
    /// # Errors
    /// `Validation` for a blank title, non-finite classification,
    /// or a content ID that names no movie
    pub async fn create(&self, owner_id: &str, new: NewReview) -> Result<ReviewDetails, AppError> {
        let title = check_title(&new.title)?;
        let classification = check_classification(new.classification)?;

        if self.db.get_movie(&new.content).await?.is_none() {
            return Err(AppError::Validation(format!(
                "content {} does not reference a movie",
                new.content
            )));
        }

        let now = Utc::now();
        let review = Review {
            id: EntityId::new().0,
            title,
            body: new.body,
            classification,
            owner_id: owner_id.to_string(),
            content_id: new.content,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_review(&review).await?;
        REVIEWS_CREATED_TOTAL.inc();
        tracing::info!(review_id = %review.id, owner_id = %review.owner_id, "Review created");

        Ok(ReviewDetails {
            review,
            likes: Vec::new(),
            comments: Vec::new(),
        })
    }

    /// All reviews, newest first
    pub async fn list(&self) -> Result<Vec<ReviewDetails>, AppError> {
        let reviews = self.db.list_reviews().await?;
        let ids: Vec<String> = reviews.iter().map(|review| review.id.clone()).collect();
        let mut relations = self.db.get_review_relations_batch(&ids).await?;

        Ok(reviews
            .into_iter()
            .map(|review| {
                let (likes, comments) = relations.remove(&review.id).unwrap_or_default();
                ReviewDetails {
                    review,
                    likes,
                    comments,
                }
            })
            .collect())
    }

    /// Get a single review
    pub async fn get(&self, review_id: &str) -> Result<ReviewDetails, AppError> {
        let review = self
            .db
            .get_review(review_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let likes = self.db.get_review_likes(review_id).await?;
        let comments = self.db.get_review_comment_ids(review_id).await?;

        Ok(ReviewDetails {
            review,
            likes,
            comments,
        })
    }

    /// Patch a review the actor owns
    pub async fn edit(
        &self,
        actor_id: &str,
        review_id: &str,
        patch: ReviewPatch,
    ) -> Result<ReviewDetails, AppError> {
        self.owned_review(actor_id, review_id).await?;

        let patch = ReviewPatch {
            title: patch.title.as_deref().map(check_title).transpose()?,
            body: patch.body,
            classification: patch.classification.map(check_classification).transpose()?,
        };
        if !self.db.update_review(review_id, &patch, Utc::now()).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(review_id, "Review edited");

        self.get(review_id).await
    }

    /// Delete a review the actor owns
    pub async fn delete(&self, actor_id: &str, review_id: &str) -> Result<(), AppError> {
        self.owned_review(actor_id, review_id).await?;

        if !self.db.delete_review(review_id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(review_id, "Review deleted");

        Ok(())
    }

    /// Comment on a review as `owner_id`
    pub async fn add_comment(
        &self,
        owner_id: &str,
        review_id: &str,
        body: Option<String>,
    ) -> Result<CommentDetails, AppError> {
        if self.db.get_review(review_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let comment = Comment {
            id: EntityId::new().0,
            body,
            owner_id: owner_id.to_string(),
            review_id: review_id.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_comment(&comment).await?;
        tracing::info!(comment_id = %comment.id, review_id, "Comment added");

        Ok(CommentDetails {
            comment,
            likes: Vec::new(),
        })
    }

    /// Delete a comment the actor owns
    pub async fn delete_comment(&self, actor_id: &str, comment_id: &str) -> Result<(), AppError> {
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if comment.owner_id != actor_id {
            return Err(AppError::Forbidden);
        }

        if !self.db.delete_comment(comment_id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(comment_id, "Comment deleted");

        Ok(())
    }

    async fn owned_review(&self, actor_id: &str, review_id: &str) -> Result<Review, AppError> {
        let review = self
            .db
            .get_review(review_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if review.owner_id != actor_id {
            return Err(AppError::Forbidden);
        }
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Movie, User};
    use tempfile::TempDir;

    async fn setup() -> (ReviewService, Arc<Database>, String, String, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );

        let mut user_ids = Vec::new();
        for (name, email) in [("alex", "ajs6@gmail.com"), ("paulo", "jnp@gmail.com")] {
            let user = User {
                id: EntityId::new().0,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: "x".to_string(),
                created_at: Utc::now(),
            };
            db.insert_user(&user).await.unwrap();
            user_ids.push(user.id);
        }

        let movie = Movie {
            id: EntityId::new().0,
            name: "Interestelar".to_string(),
            genre: None,
            rating: None,
            cover_image_url: None,
            cover_title: None,
            year: None,
            avg: None,
            synopsis: None,
            created_at: Utc::now(),
        };
        db.insert_movie(&movie).await.unwrap();

        let service = ReviewService::new(Arc::clone(&db));
        let paulo = user_ids.pop().unwrap();
        let alex = user_ids.pop().unwrap();
        (service, db, alex, paulo, temp_dir)
    }

    async fn movie_id(db: &Database) -> String {
        db.get_movie_by_name("Interestelar").await.unwrap().unwrap().id
    }

    #[tokio::test]
    async fn create_rejects_unknown_content() {
        let (service, _db, alex, _paulo, _temp_dir) = setup().await;

        let new = NewReview {
            title: "t".to_string(),
            body: None,
            classification: 5.0,
            content: "01HNOTAMOVIE".to_string(),
        };
        assert!(matches!(
            service.create(&alex, new).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_can_edit_or_delete() {
        let (service, db, alex, paulo, _temp_dir) = setup().await;

        let new = NewReview {
            title: "t".to_string(),
            body: None,
            classification: 5.0,
            content: movie_id(&db).await,
        };
        let created = service.create(&alex, new).await.unwrap();
        assert_eq!(created.review.owner_id, alex);

        let patch = ReviewPatch {
            classification: Some(3.0),
            ..Default::default()
        };
        assert!(matches!(
            service.edit(&paulo, &created.review.id, patch.clone()).await,
            Err(AppError::Forbidden)
        ));
        let edited = service.edit(&alex, &created.review.id, patch).await.unwrap();
        assert_eq!(edited.review.classification, 3.0);
        assert_eq!(edited.review.owner_id, alex);

        assert!(matches!(
            service.delete(&paulo, &created.review.id).await,
            Err(AppError::Forbidden)
        ));
        service.delete(&alex, &created.review.id).await.unwrap();
        assert!(matches!(
            service.delete(&alex, &created.review.id).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn comments_are_owner_scoped() {
        let (service, db, alex, paulo, _temp_dir) = setup().await;

        let new = NewReview {
            title: "t".to_string(),
            body: None,
            classification: 4.0,
            content: movie_id(&db).await,
        };
        let review = service.create(&alex, new).await.unwrap().review;

        let comment = service
            .add_comment(&paulo, &review.id, Some("concordo".to_string()))
            .await
            .unwrap()
            .comment;
        assert_eq!(service.get(&review.id).await.unwrap().comments, vec![comment.id.clone()]);

        assert!(matches!(
            service.delete_comment(&alex, &comment.id).await,
            Err(AppError::Forbidden)
        ));
        service.delete_comment(&paulo, &comment.id).await.unwrap();
        assert!(service.get(&review.id).await.unwrap().comments.is_empty());
    }
}
