//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Users
// =============================================================================

/// A registered user
///
/// `name` is not unique; `email` is.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a user
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}

/// Follower/following projection of the follow graph for one user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSets {
    /// Users following this user
    pub followers: Vec<String>,
    /// Users this user follows
    pub following: Vec<String>,
}

// =============================================================================
// Movies
// =============================================================================

/// Catalog record for a movie or series
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: String,
    pub name: String,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub cover_image_url: Option<String>,
    pub cover_title: Option<String>,
    pub year: Option<String>,
    pub avg: Option<f64>,
    pub synopsis: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a movie
///
/// `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct MoviePatch {
    pub name: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub cover_image_url: Option<String>,
    pub cover_title: Option<String>,
    pub year: Option<String>,
    pub avg: Option<f64>,
    pub synopsis: Option<String>,
}

// =============================================================================
// Reviews / Comments
// =============================================================================

/// A review of a catalog entry
///
/// `owner_id` is written once at creation and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub classification: f64,
    pub owner_id: String,
    /// Reviewed movie
    pub content_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a review
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub classification: Option<f64>,
}

/// A comment on a review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub body: Option<String>,
    pub owner_id: String,
    pub review_id: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a like toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeState {
    /// Whether the user likes the target after the toggle
    pub liked: bool,
    /// Resulting set of user IDs, oldest first
    pub likes: Vec<String>,
}

// =============================================================================
// Notes
// =============================================================================

/// A personal note, addressed by `(user_id, title)`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Member lists
// =============================================================================

/// Kind of member list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Watched,
    Abandoned,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watched => "watched",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watched" => Ok(Self::Watched),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(AppError::Validation(format!(
                "list type must be \"watched\" or \"abandoned\", got {other:?}"
            ))),
        }
    }
}

/// A watched/abandoned list header
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberList {
    pub list_type: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A character or actor on a list
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListMember {
    pub id: String,
    pub list_type: String,
    pub name: String,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub user_avaliation: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Partial update of a list member
#[derive(Debug, Clone, Default)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub user_avaliation: Option<f64>,
}
