use axum::routing::{get, patch};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod chat;
pub mod error;
pub mod handlers;
pub mod state;

pub use chat::ChatLog;
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route(
            "/api/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route("/api/articles/by-date", get(handlers::articles_by_date))
        .route(
            "/api/articles/:id",
            patch(handlers::update_article).delete(handlers::delete_article),
        )
        .route(
            "/api/todos",
            get(handlers::list_todos).post(handlers::add_todo),
        )
        .route(
            "/api/chat",
            get(chat::chat_stream).post(chat::post_message),
        )
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use rl_core::{Error, Result};

    pub use crate::{AppState, ChatLog};
}
