use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use super::api::{ApiError, SharedState, parse_id};
use super::models::{NewTask, Task, TaskPatch};
use super::query::{Filter, fields};

/// The trailing slash is significant: `/tasks/{id}/` addresses a lane,
/// `/tasks/{id}` addresses a single task.
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/tasks/{id}/", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
}

async fn list_tasks(
    State(state): State<SharedState>,
    Path(lane_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lane_id = parse_id(&lane_id)?;
    let tasks = state
        .repo::<Task>()
        .list(&Filter::all().eq(fields::LANE_ID, lane_id))
        .await
        .map_err(|e| ApiError::store("Failed to fetch tasks", e))?;
    Ok(Json(json!({"data": tasks})))
}

async fn get_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let task = state
        .repo::<Task>()
        .get(id)
        .await
        .map_err(|e| ApiError::store("Failed to fetch task", e))?
        .ok_or_else(ApiError::not_found::<Task>)?;
    Ok(Json(json!({"data": task, "message": "Task fetched successfully!"})))
}

/// The lane is not checked for existence.
async fn create_task(
    State(state): State<SharedState>,
    Path(lane_id): Path<String>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let lane_id = parse_id(&lane_id)?;
    let Json(new_task) = body?;
    new_task.validate().map_err(ApiError::Validation)?;

    let task = new_task.into_task(lane_id, bson::DateTime::now());
    state
        .repo::<Task>()
        .insert(&task)
        .await
        .map_err(|e| ApiError::store("Some error occurred while adding task", e))?;
    tracing::info!(task_id = %task.id, lane_id = %lane_id, "Task created");
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Task added successfully"})),
    ))
}

async fn update_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = body?;
    let update = patch
        .into_update(bson::DateTime::now())
        .ok_or(ApiError::NoFieldsToUpdate)?;

    let task = state
        .repo::<Task>()
        .update(id, &update)
        .await
        .map_err(|e| ApiError::store("Failed to update task", e))?
        .ok_or_else(ApiError::not_found::<Task>)?;
    Ok(Json(json!({"data": task, "message": "Task updated successfully!"})))
}

async fn delete_task(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .repo::<Task>()
        .delete(id)
        .await
        .map_err(|e| ApiError::store("Failed to delete task", e))?;
    match deleted {
        true => Ok(Json(json!({"message": "Task deleted successfully!"}))),
        false => Err(ApiError::not_found::<Task>()),
    }
}
