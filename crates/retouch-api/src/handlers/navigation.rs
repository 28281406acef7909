//! Sidebar navigation handler

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::state::AppState;
use retouch_core::{sidebar, AuthView, SidebarView};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NavigationQuery {
    /// Current route, used to mark the active link
    pub path: Option<String>,
}

/// Sidebar links for the current route. A valid bearer token yields the
/// signed-in view; anything else the signed-out view.
#[utoipa::path(
    get,
    path = "/api/v0/navigation",
    params(NavigationQuery),
    responses(
        (status = 200, description = "Sidebar view", body = SidebarView),
    ),
    tag = "navigation"
)]
#[tracing::instrument(skip(state, headers))]
pub async fn get_navigation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<NavigationQuery>,
) -> impl IntoResponse {
    let auth = match state.jwt.authenticate(&headers) {
        Ok(_) => AuthView::SignedIn,
        Err(_) => AuthView::SignedOut,
    };
    Json(sidebar(query.path.as_deref().unwrap_or("/"), auth))
}
