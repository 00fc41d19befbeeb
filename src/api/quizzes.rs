use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::{default_limit, validate_page};
use crate::core::state::AppState;
use crate::domain::grading::{self, QuizSubmission, ValidationResult};
use crate::domain::{rules, DomainError, Quiz};
use crate::schemas::quiz::{QuizResponse, QuizUpsert};
use crate::store::Filter;

#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize)]
pub(crate) struct QuizListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    #[serde(alias = "owner_email")]
    owner: Option<String>,
    /// Comma-separated category identifiers; a quiz matches when it
    /// references any of them.
    #[serde(default)]
    categories: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quizzes).post(create_quiz))
        .route("/validate", post(validate_quiz))
        .route("/:quiz_id", get(get_quiz).put(update_quiz).delete(delete_quiz))
}

async fn list_quizzes(
    Query(params): Query<QuizListQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizResponse>>, ApiError> {
    let page = validate_page(params.skip, params.limit)?;

    let mut filter = Filter::new();
    if let Some(title) = params.title {
        filter = filter.contains("title", title);
    }
    if let Some(description) = params.description {
        filter = filter.contains("description", description);
    }
    if let Some(owner) = params.owner {
        filter = filter.equals("owner", owner);
    }
    if let Some(categories) = params.categories {
        let ids = parse_category_ids(&categories)?;
        // An empty list means no category constraint, not "match nothing".
        if !ids.is_empty() {
            filter = filter.is_in("categories", ids.into_iter().map(|id| json!(id)).collect());
        }
    }

    let quizzes = state
        .store()
        .quizzes()
        .filter(&filter, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    Ok(Json(quizzes.into_iter().map(QuizResponse::from_entity).collect()))
}

async fn get_quiz(
    Path(quiz_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = fetch_quiz(&state, quiz_id).await?;
    Ok(Json(QuizResponse::from_entity(quiz)))
}

async fn create_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpsert>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    let quiz = payload.into_entity(None, user.email.clone());
    rules::validate_quiz_upsert(state.store().categories(), &quiz).await?;

    let quiz = state
        .store()
        .quizzes()
        .persist(quiz)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    tracing::info!(
        quiz = ?quiz.identifier,
        owner = %user.email,
        action = "quiz_create",
        "Quiz created"
    );

    Ok((StatusCode::CREATED, Json(QuizResponse::from_entity(quiz))))
}

async fn update_quiz(
    Path(quiz_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpsert>,
) -> Result<Json<QuizResponse>, ApiError> {
    let existing = fetch_quiz(&state, quiz_id).await?;
    if !rules::is_owner(&existing, &user) {
        return Err(DomainError::Forbidden.into());
    }

    // Identifier and owner are immutable; question and answer identifiers
    // are reissued because the structure may have changed arbitrarily.
    let quiz = payload.into_entity(existing.identifier, existing.owner);
    rules::validate_quiz_upsert(state.store().categories(), &quiz).await?;

    let quiz = state
        .store()
        .quizzes()
        .persist(quiz)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?;

    tracing::info!(quiz = quiz_id, owner = %user.email, action = "quiz_update", "Quiz updated");

    Ok(Json(QuizResponse::from_entity(quiz)))
}

async fn delete_quiz(
    Path(quiz_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let quiz = fetch_quiz(&state, quiz_id).await?;
    if !rules::is_owner(&quiz, &user) {
        return Err(DomainError::Forbidden.into());
    }

    state
        .store()
        .quizzes()
        .delete(&quiz)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;

    tracing::info!(quiz = quiz_id, owner = %user.email, action = "quiz_delete", "Quiz deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn validate_quiz(
    State(state): State<AppState>,
    Json(submission): Json<QuizSubmission>,
) -> Result<Json<ValidationResult>, ApiError> {
    let quiz = fetch_quiz(&state, submission.identifier).await?;
    let result = grading::grade(&quiz, &submission)?;
    Ok(Json(result))
}

async fn fetch_quiz(state: &AppState, quiz_id: i64) -> Result<Quiz, ApiError> {
    state
        .store()
        .quizzes()
        .get(&quiz_id.to_string())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz does not exist".to_string()))
}

fn parse_category_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                ApiError::BadRequest(format!("Invalid category identifier: {part}"))
            })
        })
        .collect()
}
