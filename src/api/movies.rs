//! Movie catalog endpoints

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};

use super::dto::*;
use crate::AppState;
use crate::data::{EntityId, Movie, MoviePatch};
use crate::error::AppError;

/// Movie routes, mounted under `/movies`
pub fn movies_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movies))
        .route("/add", post(create_movie))
        .route("/get", get(find_movie))
        .route("/update", put(update_movie))
        .route("/delete", delete(delete_movie))
}

fn require_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(trimmed)
}

/// POST /movies/add
pub async fn create_movie(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateMovieRequest>,
) -> Result<(StatusCode, Json<MovieResponse>), AppError> {
    let name = require_name(&req.name)?.to_string();
    let cover = req.cover.unwrap_or_default();

    let movie = Movie {
        id: EntityId::new().0,
        name,
        genre: req.genre,
        rating: req.rating,
        cover_image_url: cover.image_url,
        cover_title: cover.title,
        year: req.year,
        avg: req.avg,
        synopsis: req.synopsis,
        created_at: chrono::Utc::now(),
    };
    state.db.insert_movie(&movie).await?;
    tracing::info!(movie_id = %movie.id, name = %movie.name, "Movie added");

    Ok((StatusCode::CREATED, Json(MovieResponse::from(movie))))
}

/// GET /movies
pub async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<MovieResponse>>, AppError> {
    let movies = state.db.list_movies().await?;
    Ok(Json(movies.into_iter().map(MovieResponse::from).collect()))
}

/// GET /movies/get?name=
pub async fn find_movie(
    State(state): State<AppState>,
    Query(query): Query<MovieNameQuery>,
) -> Result<Json<MovieResponse>, AppError> {
    let name = query
        .name
        .ok_or_else(|| AppError::Validation("name query parameter is required".to_string()))?;
    let name = require_name(&name)?;

    let movie = state
        .db
        .get_movie_by_name(name)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(MovieResponse::from(movie)))
}

/// PUT /movies/update
pub async fn update_movie(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateMovieRequest>,
) -> Result<Json<MovieResponse>, AppError> {
    let name = require_name(&req.name)?;
    let updates = req.updates;
    let new_name = updates
        .name
        .as_deref()
        .map(require_name)
        .transpose()?
        .map(str::to_string);
    let cover = updates.cover.unwrap_or_default();

    let patch = MoviePatch {
        name: new_name.clone(),
        genre: updates.genre,
        rating: updates.rating,
        cover_image_url: cover.image_url,
        cover_title: cover.title,
        year: updates.year,
        avg: updates.avg,
        synopsis: updates.synopsis,
    };
    if !state.db.update_movie_by_name(name, &patch).await? {
        return Err(AppError::NotFound);
    }

    let current_name = new_name.as_deref().unwrap_or(name);
    let movie = state
        .db
        .get_movie_by_name(current_name)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(movie_id = %movie.id, "Movie updated");

    Ok(Json(MovieResponse::from(movie)))
}

/// DELETE /movies/delete
pub async fn delete_movie(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MovieNameRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let name = require_name(&req.name)?;
    if !state.db.delete_movie_by_name(name).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(name = %name, "Movie deleted");

    Ok(Json(MessageResponse::new("movie deleted")))
}
