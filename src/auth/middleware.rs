//! Authentication middleware
//!
//! Protects routes that require a bearer token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};

use super::token::verify_token;
use crate::AppState;
use crate::error::AppError;

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// ID of the user the token was issued to
    pub user_id: String,
}

fn extract_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verify the bearer token and confirm its subject still exists
async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthUser, AppError> {
    let token = extract_token_from_headers(headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_token(token, &state.config.auth.token_secret)?;

    if state.db.get_user(&claims.sub).await?.is_none() {
        tracing::debug!(user_id = %claims.sub, "Token subject no longer exists");
        return Err(AppError::Unauthorized);
    }

    Ok(AuthUser {
        user_id: claims.sub,
    })
}

/// Middleware to require authentication
///
/// Verifies the `Authorization: Bearer` token, checks that the user it
/// names still exists, and adds `AuthUser` to request extensions.
/// Rejects with 401 otherwise.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/reviews/add", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = match authenticate(request.headers(), &state).await {
        Ok(user) => user,
        Err(error) => {
            tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
            return Err(error);
        }
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extractor for the current authenticated user
///
/// This is the only source handlers use for the acting or owning user;
/// identity fields in request bodies are never trusted.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", user.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let user = authenticate(&parts.headers, &state).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}
