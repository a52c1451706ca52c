//! Review and comment endpoints

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post, put},
};

use super::dto::*;
use crate::AppState;
use crate::auth::{CurrentUser, require_auth};
use crate::data::ReviewPatch;
use crate::error::AppError;
use crate::service::{NewReview, ReviewService, SocialService};

fn build_review_service(state: &AppState) -> ReviewService {
    ReviewService::new(state.db.clone())
}

/// Review routes, mounted under `/reviews`
pub fn reviews_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new().route("/get", get(list_reviews));

    let authenticated_routes = Router::new()
        .route("/add", post(create_review))
        .route("/delete", delete(delete_review))
        .route("/edit", put(edit_review))
        .route("/like", put(like_review))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(authenticated_routes)
}

/// Comment routes, mounted under `/comment`
pub fn comments_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/add", post(create_comment))
        .route("/delete", delete(delete_comment))
        .route("/like", put(like_comment))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// POST /reviews/add
///
/// The owner is always the caller.
pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let new = NewReview {
        title: req.title,
        body: req.body,
        classification: req.classification,
        content: req.content,
    };
    let created = build_review_service(&state)
        .create(&user.user_id, new)
        .await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(created))))
}

/// GET /reviews/get
pub async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let reviews = build_review_service(&state).list().await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// DELETE /reviews/delete
pub async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ReviewIdRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    build_review_service(&state)
        .delete(&user.user_id, &req.review_id)
        .await?;

    Ok(Json(MessageResponse::new("review deleted")))
}

/// PUT /reviews/edit
pub async fn edit_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<EditReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let patch = ReviewPatch {
        title: req.updates.title,
        body: req.updates.body,
        classification: req.updates.classification,
    };
    let edited = build_review_service(&state)
        .edit(&user.user_id, &req.review_id, patch)
        .await?;

    Ok(Json(ReviewResponse::from(edited)))
}

/// PUT /reviews/like
pub async fn like_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<LikeReviewRequest>,
) -> Result<Json<LikeResponse>, AppError> {
    let like_state = SocialService::new(state.db.clone())
        .like_review(&user.user_id, req.user_id.as_deref(), &req.review_id)
        .await?;

    Ok(Json(LikeResponse::from(like_state)))
}

/// POST /comment/add
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let created = build_review_service(&state)
        .add_comment(&user.user_id, &req.review, req.body)
        .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(created))))
}

/// DELETE /comment/delete
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<CommentIdRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    build_review_service(&state)
        .delete_comment(&user.user_id, &req.comment_id)
        .await?;

    Ok(Json(MessageResponse::new("comment deleted")))
}

/// PUT /comment/like
pub async fn like_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<LikeCommentRequest>,
) -> Result<Json<LikeResponse>, AppError> {
    let like_state = SocialService::new(state.db.clone())
        .like_comment(&user.user_id, req.user_id.as_deref(), &req.comment_id)
        .await?;

    Ok(Json(LikeResponse::from(like_state)))
}
