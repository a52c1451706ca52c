//! Request and response DTOs
//!
//! Field names are camelCase on the wire.

use axum::extract::FromRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{FollowSets, LikeState, ListMember, MemberList, Movie, Note, User};
use crate::error::AppError;
use crate::service::{CommentDetails, FollowOutcome, ReviewDetails};

/// JSON body extractor whose rejections are `AppError::Validation`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `POST /users/follow`
///
/// `followerId` is optional; when present it must be the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub follower_id: Option<String>,
    pub following_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdates {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub updates: UserUpdates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<(User, FollowSets)> for UserResponse {
    fn from((user, sets): (User, FollowSets)) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            followers: sets.followers,
            following: sets.following,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowSummary {
    pub id: String,
    pub followers_count: usize,
    pub following_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowResponse {
    pub following: bool,
    pub follower: FollowSummary,
    pub target: FollowSummary,
}

impl From<FollowOutcome> for FollowResponse {
    fn from(outcome: FollowOutcome) -> Self {
        Self {
            following: outcome.following,
            follower: FollowSummary {
                id: outcome.follower_id,
                followers_count: outcome.follower.followers.len(),
                following_count: outcome.follower.following.len(),
            },
            target: FollowSummary {
                id: outcome.following_id,
                followers_count: outcome.target.followers.len(),
                following_count: outcome.target.following.len(),
            },
        }
    }
}

// =============================================================================
// Reviews / Comments
// =============================================================================

/// Body of `POST /reviews/add`
///
/// Has no `owner` field; an owner sent by the client is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub title: String,
    pub body: Option<String>,
    pub classification: f64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewIdRequest {
    pub review_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewUpdates {
    pub title: Option<String>,
    pub body: Option<String>,
    pub classification: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReviewRequest {
    pub review_id: String,
    #[serde(default)]
    pub updates: ReviewUpdates,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeReviewRequest {
    pub review_id: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: Option<String>,
    pub review: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentIdRequest {
    pub comment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeCommentRequest {
    pub comment_id: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub classification: f64,
    pub owner: String,
    pub likes: Vec<String>,
    pub comments: Vec<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReviewDetails> for ReviewResponse {
    fn from(details: ReviewDetails) -> Self {
        let review = details.review;
        Self {
            id: review.id,
            title: review.title,
            body: review.body,
            classification: review.classification,
            owner: review.owner_id,
            likes: details.likes,
            comments: details.comments,
            content: review.content_id,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub body: Option<String>,
    pub owner: String,
    pub review: String,
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CommentDetails> for CommentResponse {
    fn from(details: CommentDetails) -> Self {
        let comment = details.comment;
        Self {
            id: comment.id,
            body: comment.body,
            owner: comment.owner_id,
            review: comment.review_id,
            likes: details.likes,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: usize,
    pub likes: Vec<String>,
}

impl From<LikeState> for LikeResponse {
    fn from(state: LikeState) -> Self {
        Self {
            liked: state.liked,
            likes_count: state.likes.len(),
            likes: state.likes,
        }
    }
}

// =============================================================================
// Movies
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverDto {
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub name: String,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub cover: Option<CoverDto>,
    pub year: Option<String>,
    pub avg: Option<f64>,
    pub synopsis: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieUpdates {
    pub name: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub cover: Option<CoverDto>,
    pub year: Option<String>,
    pub avg: Option<f64>,
    pub synopsis: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovieRequest {
    pub name: String,
    #[serde(default)]
    pub updates: MovieUpdates,
}

#[derive(Debug, Deserialize)]
pub struct MovieNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MovieNameQuery {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieResponse {
    pub id: String,
    pub name: String,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub cover: CoverDto,
    pub year: Option<String>,
    pub avg: Option<f64>,
    pub synopsis: Option<String>,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            name: movie.name,
            genre: movie.genre,
            rating: movie.rating,
            cover: CoverDto {
                image_url: movie.cover_image_url,
                title: movie.cover_title,
            },
            year: movie.year,
            avg: movie.avg,
            synopsis: movie.synopsis,
        }
    }
}

// =============================================================================
// Notes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub email: String,
    pub title: String,
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteKeyRequest {
    pub email: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteQuery {
    pub email: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            title: note.title,
            note: note.note,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

// =============================================================================
// Member lists
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub name: String,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub user_avaliation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdateRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub user_avaliation: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub name: String,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub user_avaliation: Option<f64>,
}

impl From<ListMember> for MemberResponse {
    fn from(member: ListMember) -> Self {
        Self {
            name: member.name,
            gender: member.gender,
            description: member.description,
            user_avaliation: member.user_avaliation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    #[serde(rename = "type")]
    pub list_type: String,
    pub name: String,
    pub members: Vec<MemberResponse>,
    pub created_at: DateTime<Utc>,
}

impl ListResponse {
    pub fn new(list: MemberList, members: Vec<ListMember>) -> Self {
        Self {
            list_type: list.list_type,
            name: list.name,
            members: members.into_iter().map(MemberResponse::from).collect(),
            created_at: list.created_at,
        }
    }
}

// =============================================================================
// Misc
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
