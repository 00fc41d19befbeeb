use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{default_limit, validate_page};
use crate::core::state::AppState;
use crate::domain::rules;
use crate::schemas::category::{CategoryResponse, CategoryUpsert};
use crate::store::Filter;


#[derive(Debug, Deserialize)]
pub(crate) struct CategoryListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:category_id", get(get_category).delete(delete_category))
}

async fn list_categories(
    Query(params): Query<CategoryListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let page = validate_page(params.skip, params.limit)?;

    let mut filter = Filter::new();
    if let Some(title) = params.title {
        filter = filter.contains("title", title);
    }
    if let Some(description) = params.description {
        filter = filter.contains("description", description);
    }

    let categories = state
        .store()
        .categories()
        .filter(&filter, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list categories"))?;

    Ok(Json(categories.into_iter().map(CategoryResponse::from_entity).collect()))
}

async fn get_category(
    Path(category_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = state
        .store()
        .categories()
        .get(&category_id.to_string())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch category"))?
        .ok_or_else(|| ApiError::NotFound("Category does not exist".to_string()))?;

    Ok(Json(CategoryResponse::from_entity(category)))
}

async fn create_category(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CategoryUpsert>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category = payload.into_entity();
    rules::validate_category_fields(&category)?;

    // Titles are unique by exact match, not by substring.
    let duplicates = state
        .store()
        .categories()
        .filter(&Filter::new().equals("title", category.title.clone()), crate::store::Page::first())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing category"))?;
    if !duplicates.is_empty() {
        return Err(ApiError::Conflict("Category with this title already exists".to_string()));
    }

    let category = state
        .store()
        .categories()
        .persist(category)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create category"))?;

    tracing::info!(
        category = ?category.identifier,
        user = %user.email,
        action = "category_create",
        "Category created"
    );

    Ok((StatusCode::CREATED, Json(CategoryResponse::from_entity(category))))
}

async fn delete_category(
    Path(category_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let category = state
        .store()
        .categories()
        .get(&category_id.to_string())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch category"))?
        .ok_or_else(|| ApiError::NotFound("Category does not exist".to_string()))?;

    if rules::category_in_use(state.store().quizzes(), category_id).await? {
        return Err(ApiError::Conflict(
            "Category is in use by at least one quiz and cannot be deleted".to_string(),
        ));
    }

    state
        .store()
        .categories()
        .delete(&category)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete category"))?;

    tracing::info!(
        category = category_id,
        user = %user.email,
        action = "category_delete",
        "Category deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
