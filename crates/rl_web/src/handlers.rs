use axum::extract::{Path, Query, State};
use axum::Json;
use rl_core::query::{group_by_day, DateRange, GroupedArticles};
use rl_core::types::{
    Article, CreateArticleRequest, CreateTodoRequest, Todo, UpdateArticleRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ArticleFilter>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let range = DateRange::parse(filter.start_date.as_deref(), filter.end_date.as_deref())?;
    Ok(Json(state.storage.list_articles(&range).await?))
}

pub async fn articles_by_date(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GroupedArticles>, ApiError> {
    let articles = state.storage.list_articles(&DateRange::default()).await?;
    Ok(Json(group_by_day(articles)))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    let draft = request.into_draft()?;
    Ok(Json(state.storage.create_article(draft).await?))
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    let update = request.into_update()?;
    Ok(Json(state.storage.update_article(id, update).await?))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.storage.delete_article(id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

pub async fn list_todos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.storage.list_todos().await?))
}

pub async fn add_todo(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    let title = request.into_title()?;
    Ok(Json(state.storage.add_todo(title).await?))
}
