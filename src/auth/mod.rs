//! Authentication
//!
//! Handles:
//! - Password hashing (bcrypt)
//! - Bearer token issuance and verification
//! - Authentication middleware

mod middleware;
pub mod password;
pub mod token;

pub use middleware::{AuthUser, CurrentUser, require_auth};
pub use password::{hash_password, verify_password};
pub use token::{Claims, issue_token, verify_token};
