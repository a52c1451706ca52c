//! API layer
//!
//! HTTP handlers for:
//! - Users, login and the follow graph
//! - Reviews and comments
//! - Movie catalog, notes and member lists
//! - Metrics (Prometheus)

mod dto;
mod lists;
pub mod metrics;
mod movies;
mod notes;
mod reviews;
mod users;

pub use dto::*;

pub use lists::lists_router;
pub use metrics::{metrics_router, track_requests};
pub use movies::movies_router;
pub use notes::notes_router;
pub use reviews::{comments_router, reviews_router};
pub use users::users_router;
