//! User endpoints

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
};

use super::dto::*;
use crate::AppState;
use crate::auth::{CurrentUser, require_auth};
use crate::data::FollowSets;
use crate::error::AppError;
use crate::service::{SocialService, UserService, UserUpdate};

fn build_user_service(state: &AppState) -> UserService {
    UserService::new(state.db.clone(), state.config.auth.clone())
}

/// User routes, mounted under `/users`
pub fn users_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/", get(list_users))
        .route("/add", post(register))
        .route("/login", post(login))
        .route("/find/:name", get(find_users));

    let authenticated_routes = Router::new()
        .route("/follow", post(follow))
        .route("/:name", put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(authenticated_routes)
}

/// POST /users/add
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = build_user_service(&state)
        .register(&req.name, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from((user, FollowSets::default()))),
    ))
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = build_user_service(&state)
        .login(&req.email, &req.password)
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = build_user_service(&state).list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/find/:name
pub async fn find_users(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = build_user_service(&state).find_by_name(&name).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /users/follow
///
/// Toggles the caller's follow of `followingId`.
pub async fn follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<FollowRequest>,
) -> Result<Json<FollowResponse>, AppError> {
    let outcome = SocialService::new(state.db.clone())
        .follow(&user.user_id, req.follower_id.as_deref(), &req.following_id)
        .await?;

    Ok(Json(FollowResponse::from(outcome)))
}

/// PUT /users/:name
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let update = UserUpdate {
        name: req.updates.name,
        email: req.updates.email,
        password: req.updates.password,
    };
    let updated = build_user_service(&state)
        .update_self(&user.user_id, &name, update)
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// DELETE /users/:name
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    build_user_service(&state)
        .delete_self(&user.user_id, &name)
        .await?;

    Ok(Json(MessageResponse::new("user deleted")))
}
