use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use super::api::{ApiError, SharedState, parse_id};
use super::models::{Lane, LanePatch, NewLane};
use super::query::Filter;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/lanes", get(list_lanes).post(create_lane))
        .route("/lanes/", get(list_lanes).post(create_lane))
        .route(
            "/lanes/{id}",
            get(get_lane).patch(update_lane).delete(delete_lane),
        )
}

async fn list_lanes(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let lanes = state
        .repo::<Lane>()
        .list(&Filter::all())
        .await
        .map_err(|e| ApiError::store("Failed to fetch lanes", e))?;
    Ok(Json(json!({"data": lanes})))
}

async fn get_lane(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let lane = state
        .repo::<Lane>()
        .get(id)
        .await
        .map_err(|e| ApiError::store("Failed to fetch lane", e))?
        .ok_or_else(ApiError::not_found::<Lane>)?;
    Ok(Json(json!({"data": lane, "message": "Lane fetched successfully!"})))
}

async fn create_lane(
    State(state): State<SharedState>,
    body: Result<Json<NewLane>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_lane) = body?;
    new_lane.validate().map_err(ApiError::Validation)?;

    let lane = new_lane.into_lane(bson::DateTime::now());
    state
        .repo::<Lane>()
        .insert(&lane)
        .await
        .map_err(|e| ApiError::store("Some error occurred while adding lane", e))?;
    tracing::info!(lane_id = %lane.id, "Lane created");
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Lane added successfully"})),
    ))
}

async fn update_lane(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Result<Json<LanePatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = body?;
    let update = patch
        .into_update(bson::DateTime::now())
        .ok_or(ApiError::NoFieldsToUpdate)?;

    let lane = state
        .repo::<Lane>()
        .update(id, &update)
        .await
        .map_err(|e| ApiError::store("Failed to update lane", e))?
        .ok_or_else(ApiError::not_found::<Lane>)?;
    Ok(Json(json!({"data": lane, "message": "Lane updated successfully!"})))
}

/// Tasks in the lane are left as they are.
async fn delete_lane(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .repo::<Lane>()
        .delete(id)
        .await
        .map_err(|e| ApiError::store("Failed to delete lane", e))?;
    match deleted {
        true => Ok(Json(json!({"message": "Lane deleted successfully!"}))),
        false => Err(ApiError::not_found::<Lane>()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::api::testing::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_list_lanes() {
        let app = test_app();
        for title in ["Todo", "Doing", "Done"] {
            let (status, body) =
                send(&app, "POST", "/api/v1/lanes", Some(json!({"title": title}))).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["message"], "Lane added successfully");
        }

        let (status, body) = send(&app, "GET", "/api/v1/lanes", None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Todo", "Doing", "Done"]);
        for lane in body["data"].as_array().unwrap() {
            assert_eq!(lane["created_at"], lane["updated_at"]);
        }
    }

    #[tokio::test]
    async fn test_create_lane_requires_title() {
        let app = test_app();
        let (status, body) = send(&app, "POST", "/api/v1/lanes", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Required fields are missing");
    }

    #[tokio::test]
    async fn test_whitespace_title_is_text() {
        let app = test_app();
        let (status, _) = send(&app, "POST", "/api/v1/lanes", Some(json!({"title": "   "}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, list) = send(&app, "GET", "/api/v1/lanes", None).await;
        assert_eq!(list["data"][0]["title"], "   ");
        let uri = format!("/api/v1/lanes/{}", single_id(&list));

        let (status, body) = send(&app, "PATCH", &uri, Some(json!({"title": "  "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "  ");
    }

    #[tokio::test]
    async fn test_collection_accepts_trailing_slash() {
        let app = test_app();
        let (status, _) = send(&app, "POST", "/api/v1/lanes/", Some(json!({"title": "Todo"}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "GET", "/api/v1/lanes/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["title"], "Todo");

        let (status, body) = send(&app, "GET", "/api/v1/bugs/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_lane() {
        let app = test_app();
        send(&app, "POST", "/api/v1/lanes", Some(json!({"title": "Todo"}))).await;
        let (_, list) = send(&app, "GET", "/api/v1/lanes", None).await;
        let id = single_id(&list);

        let (status, body) = send(&app, "GET", &format!("/api/v1/lanes/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Todo");
    }

    #[tokio::test]
    async fn test_update_lane() {
        let app = test_app();
        send(&app, "POST", "/api/v1/lanes", Some(json!({"title": "Todo"}))).await;
        let (_, list) = send(&app, "GET", "/api/v1/lanes", None).await;
        let uri = format!("/api/v1/lanes/{}", single_id(&list));

        let (status, body) = send(&app, "PATCH", &uri, Some(json!({"title": "Backlog"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Backlog");
        assert_eq!(body["message"], "Lane updated successfully!");

        let (status, body) = send(&app, "PATCH", &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No fields to update");
    }

    #[tokio::test]
    async fn test_update_lane_not_found() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "PATCH",
            "/api/v1/lanes/5f1d7f1c2b3a4c5d6e7f8a9b",
            Some(json!({"title": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Lane not found");
    }

    #[tokio::test]
    async fn test_delete_lane() {
        let app = test_app();
        send(&app, "POST", "/api/v1/lanes", Some(json!({"title": "Todo"}))).await;
        let (_, list) = send(&app, "GET", "/api/v1/lanes", None).await;
        let uri = format!("/api/v1/lanes/{}", single_id(&list));

        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Lane deleted successfully!");

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_ids_rejected() {
        let app = test_app();
        let uri = "/api/v1/lanes/not-an-object-id";
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid ID");
        let (status, _) = send(&app, "PATCH", uri, Some(json!({"title": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
