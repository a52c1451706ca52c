//! Personal note endpoints
//!
//! Notes are addressed by the owner's email and the note title.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};
use chrono::Utc;

use super::dto::*;
use crate::AppState;
use crate::data::{EntityId, Note, User};
use crate::error::AppError;

/// Note routes, mounted under `/notes`
pub fn notes_router() -> Router<AppState> {
    Router::new()
        .route("/add", post(create_note))
        .route("/find", get(find_notes))
        .route("/edit", put(edit_note))
        .route("/dell", delete(delete_note))
        .route("/:email", get(notes_by_email))
}

async fn user_by_email(state: &AppState, email: &str) -> Result<User, AppError> {
    state
        .db
        .get_user_by_email(email)
        .await?
        .ok_or(AppError::NotFound)
}

/// POST /notes/add
pub async fn create_note(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    let user = user_by_email(&state, &req.email).await?;

    let now = Utc::now();
    let note = Note {
        id: EntityId::new().0,
        user_id: user.id,
        title: title.to_string(),
        note: req.note,
        created_at: now,
        updated_at: now,
    };
    state.db.insert_note(&note).await?;
    tracing::debug!(note_id = %note.id, "Note created");

    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

/// GET /notes/find?email=&title=
///
/// Both filters are optional. 404 when nothing matches.
pub async fn find_notes(
    State(state): State<AppState>,
    Query(query): Query<NoteQuery>,
) -> Result<Json<Vec<NoteResponse>>, AppError> {
    let notes = state
        .db
        .find_notes(query.email.as_deref(), query.title.as_deref())
        .await?;
    if notes.is_empty() {
        return Err(AppError::NotFound);
    }

    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

/// PUT /notes/edit
pub async fn edit_note(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NoteRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = user_by_email(&state, &req.email).await?;

    if !state
        .db
        .update_note(&user.id, req.title.trim(), &req.note, Utc::now())
        .await?
    {
        return Err(AppError::NotFound);
    }

    Ok(Json(MessageResponse::new("note updated")))
}

/// GET /notes/:email
pub async fn notes_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<NoteResponse>>, AppError> {
    let user = user_by_email(&state, &email).await?;
    let notes = state.db.get_notes_by_user(&user.id).await?;

    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

/// DELETE /notes/dell
pub async fn delete_note(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NoteKeyRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = user_by_email(&state, &req.email).await?;

    if !state.db.delete_note(&user.id, req.title.trim()).await? {
        return Err(AppError::NotFound);
    }

    Ok(Json(MessageResponse::new("note deleted")))
}
