//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services own ownership checks and identity rules; handlers only
//! translate between HTTP and these calls.

mod review;
mod social;
mod user;

pub use review::{CommentDetails, NewReview, ReviewDetails, ReviewService};
pub use social::{FollowOutcome, SocialService};
pub use user::{UserService, UserUpdate};
