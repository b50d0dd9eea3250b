use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use super::api::{ApiError, SharedState, parse_id};
use super::models::{Bug, BugPatch, NewBug};
use super::query::Filter;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/bugs", get(list_bugs).post(create_bug))
        .route("/bugs/", get(list_bugs).post(create_bug))
        .route(
            "/bugs/{id}",
            get(get_bug).put(update_bug).delete(delete_bug),
        )
}

async fn list_bugs(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let bugs = state
        .repo::<Bug>()
        .list(&Filter::all())
        .await
        .map_err(|e| ApiError::store("Failed to fetch bugs", e))?;
    Ok(Json(json!({"data": bugs})))
}

async fn get_bug(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let bug = state
        .repo::<Bug>()
        .get(id)
        .await
        .map_err(|e| ApiError::store("Failed to fetch bug", e))?
        .ok_or_else(ApiError::not_found::<Bug>)?;
    Ok(Json(json!({"data": bug, "message": "Bug fetched successfully!"})))
}

async fn create_bug(
    State(state): State<SharedState>,
    body: Result<Json<NewBug>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_bug) = body?;
    new_bug.validate().map_err(ApiError::Validation)?;

    let bug = new_bug.into_bug(bson::DateTime::now());
    state
        .repo::<Bug>()
        .insert(&bug)
        .await
        .map_err(|e| ApiError::store("Some error occurred while adding bug", e))?;
    tracing::info!(bug_id = %bug.id, "Bug created");
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Bug added successfully"})),
    ))
}

async fn update_bug(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<BugPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = body?;
    let update = patch
        .into_update(bson::DateTime::now())
        .ok_or(ApiError::NoFieldsToUpdate)?;

    let bug = state
        .repo::<Bug>()
        .update(id, &update)
        .await
        .map_err(|e| ApiError::store("Failed to update bug", e))?
        .ok_or_else(ApiError::not_found::<Bug>)?;
    Ok(Json(json!({"data": bug, "message": "Bug updated successfully!"})))
}

async fn delete_bug(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .repo::<Bug>()
        .delete(id)
        .await
        .map_err(|e| ApiError::store("Failed to delete bug", e))?;
    match deleted {
        true => Ok(Json(json!({"message": "Bug deleted successfully!"}))),
        false => Err(ApiError::not_found::<Bug>()),
    }
}
