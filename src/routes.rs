use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::FeedSources;
use crate::fetcher::{FeedEntry, Fetcher};

pub struct AppState {
    pub feeds: FeedSources,
    pub fetcher: Arc<Fetcher>,
    /// Browser poll interval in seconds, handed to the page template
    pub refresh_interval: u64,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub news_label: String,
    pub threats_label: String,
    pub refresh_interval: u64,
}

#[derive(Debug, Serialize)]
pub struct UpdatesResponse {
    pub news: Vec<FeedEntry>,
    pub threats: Vec<FeedEntry>,
    pub timestamp: String,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/updates", get(updates))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    HtmlTemplate(DashboardTemplate {
        news_label: state.feeds.news.label.clone(),
        threats_label: state.feeds.cisa.label.clone(),
        refresh_interval: state.refresh_interval,
    })
}

pub async fn updates(State(state): State<Arc<AppState>>) -> Json<UpdatesResponse> {
    let (news, threats) = tokio::join!(
        state.fetcher.fetch_or_empty(&state.feeds.news),
        state.fetcher.fetch_or_empty(&state.feeds.cisa),
    );

    Json(UpdatesResponse {
        news,
        threats,
        timestamp: Local::now().format("%H:%M:%S").to_string(),
    })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
