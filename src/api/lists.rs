//! Watched / abandoned list endpoints

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};

use super::dto::*;
use crate::AppState;
use crate::data::{EntityId, ListMember, ListType, MemberList, MemberPatch};
use crate::error::AppError;

/// List routes, mounted under `/api`
pub fn lists_router() -> Router<AppState> {
    Router::new()
        .route("/lists", get(all_lists))
        .route(
            "/lists/:type",
            post(create_list).get(get_list).delete(delete_list),
        )
        .route("/lists/:type/members", post(add_member))
        .route(
            "/lists/:type/members/:member_name",
            get(get_member).put(update_member).delete(remove_member),
        )
}

fn require_text(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

async fn existing_list(state: &AppState, list_type: ListType) -> Result<MemberList, AppError> {
    state
        .db
        .get_list(list_type)
        .await?
        .ok_or(AppError::NotFound)
}

/// POST /api/lists/:type
pub async fn create_list(
    State(state): State<AppState>,
    Path(list_type): Path<String>,
    ApiJson(req): ApiJson<CreateListRequest>,
) -> Result<(StatusCode, Json<ListResponse>), AppError> {
    let list_type: ListType = list_type.parse()?;

    let list = MemberList {
        list_type: list_type.as_str().to_string(),
        name: require_text(&req.name, "name")?,
        created_at: chrono::Utc::now(),
    };
    state.db.insert_list(&list).await?;
    tracing::info!(%list_type, "List created");

    Ok((StatusCode::CREATED, Json(ListResponse::new(list, Vec::new()))))
}

/// GET /api/lists/:type
pub async fn get_list(
    State(state): State<AppState>,
    Path(list_type): Path<String>,
) -> Result<Json<ListResponse>, AppError> {
    let list_type: ListType = list_type.parse()?;
    let list = existing_list(&state, list_type).await?;
    let members = state.db.get_list_members(list_type).await?;

    Ok(Json(ListResponse::new(list, members)))
}

/// GET /api/lists
pub async fn all_lists(State(state): State<AppState>) -> Result<Json<Vec<ListResponse>>, AppError> {
    let lists = state.db.list_lists().await?;

    let mut response = Vec::with_capacity(lists.len());
    for list in lists {
        let list_type: ListType = list.list_type.parse()?;
        let members = state.db.get_list_members(list_type).await?;
        response.push(ListResponse::new(list, members));
    }

    Ok(Json(response))
}

/// DELETE /api/lists/:type
pub async fn delete_list(
    State(state): State<AppState>,
    Path(list_type): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let list_type: ListType = list_type.parse()?;
    if !state.db.delete_list(list_type).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(%list_type, "List deleted");

    Ok(Json(MessageResponse::new("list deleted")))
}

/// GET /api/lists/:type/members/:member_name
pub async fn get_member(
    State(state): State<AppState>,
    Path((list_type, member_name)): Path<(String, String)>,
) -> Result<Json<MemberResponse>, AppError> {
    let list_type: ListType = list_type.parse()?;
    let member = state
        .db
        .get_list_member(list_type, &member_name)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(MemberResponse::from(member)))
}

/// POST /api/lists/:type/members
pub async fn add_member(
    State(state): State<AppState>,
    Path(list_type): Path<String>,
    ApiJson(req): ApiJson<MemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), AppError> {
    let list_type: ListType = list_type.parse()?;
    existing_list(&state, list_type).await?;

    let member = ListMember {
        id: EntityId::new().0,
        list_type: list_type.as_str().to_string(),
        name: require_text(&req.name, "name")?,
        gender: req.gender,
        description: req.description,
        user_avaliation: req.user_avaliation,
        created_at: chrono::Utc::now(),
    };
    state.db.insert_list_member(&member).await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// PUT /api/lists/:type/members/:member_name
pub async fn update_member(
    State(state): State<AppState>,
    Path((list_type, member_name)): Path<(String, String)>,
    ApiJson(req): ApiJson<MemberUpdateRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    let list_type: ListType = list_type.parse()?;
    let new_name = req
        .name
        .as_deref()
        .map(|name| require_text(name, "name"))
        .transpose()?;

    let patch = MemberPatch {
        name: new_name.clone(),
        gender: req.gender,
        description: req.description,
        user_avaliation: req.user_avaliation,
    };
    if !state
        .db
        .update_list_member(list_type, &member_name, &patch)
        .await?
    {
        return Err(AppError::NotFound);
    }

    let current_name = new_name.unwrap_or(member_name);
    let member = state
        .db
        .get_list_member(list_type, &current_name)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(MemberResponse::from(member)))
}

/// DELETE /api/lists/:type/members/:member_name
pub async fn remove_member(
    State(state): State<AppState>,
    Path((list_type, member_name)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let list_type: ListType = list_type.parse()?;
    if !state
        .db
        .delete_list_member(list_type, &member_name)
        .await?
    {
        return Err(AppError::NotFound);
    }

    Ok(Json(MessageResponse::new("member removed")))
}
