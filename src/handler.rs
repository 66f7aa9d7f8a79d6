use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::info;

use crate::api::{APIResponse, NavQuery};
use crate::assets;
use crate::badge::BadgeBoard;
use crate::dom;
use crate::error::PageError;
use crate::highlight::{self, HighlightStyle};
use crate::model::NavManifest;
use crate::render;
use crate::route::RouteTable;
use crate::server_error;

#[derive(Clone)]
pub struct AppState {
    pub nav: Arc<NavManifest>,
    pub table: Arc<RouteTable>,
    pub style: Arc<HighlightStyle>,
    pub badges: Arc<RwLock<BadgeBoard>>,
    pub badge_ttl: chrono::Duration,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(APIResponse::new_from_msg("ok"))
}

/// The manifest as JSON, with the active route resolved for an optional
/// `?path=` — what a client-rendered consumer would use instead of the
/// served pages.
pub async fn get_nav(State(state): State<AppState>, Query(q): Query<NavQuery>) -> Response {
    let active = q
        .path
        .as_deref()
        .and_then(|path| state.table.resolve(path))
        .map(str::to_string);
    let response = APIResponse::with_nav("ok", state.nav.audiences.clone(), active);
    (StatusCode::OK, Json(response)).into_response()
}

/// Builds the final markup for a request path: page shell, sidebar graft,
/// route injection, active-link marking.
async fn build_page(state: &AppState, lookup: &str) -> Result<String, PageError> {
    let current = state
        .table
        .resolve(lookup)
        .ok_or_else(|| PageError::NotFound(lookup.to_string()))?;
    let source =
        assets::page(current).ok_or_else(|| PageError::NotFound(current.to_string()))?;
    let mut page = dom::parse(&source)?;

    if let Some(slot) = render::find_sidebar_slot(&page) {
        if let Some(nav) = state.nav.audience_for(lookup) {
            let badges = state.badges.read().await.live(state.badge_ttl);
            render::graft_sidebar(&mut page, slot, nav, &badges, &state.style);
        }
    }
    render::inject_current_route(&mut page, &state.style, Some(current));
    let summary = highlight::mark_active(&mut page, Some(current), &state.style);
    info!(
        "served page. route: {}, matched: {}, badges_recolored: {}",
        current, summary.matched, summary.badges_recolored
    );

    Ok(page.to_html(page.root()))
}

/// Serves a page shell with its sidebar grafted in and the active entry
/// highlighted. The route is resolved from the request path alone; a path
/// that resolves to nothing is a plain 404, and a page whose shell has no
/// sidebar slot is served untouched.
pub async fn serve_page(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let path = uri.path();
    if let Some(rest) = path.strip_prefix("/static/") {
        return assets::serve_static(rest);
    }

    // the portal roots agency users at their dashboard
    let lookup = if path == "/" { "/dashboard/" } else { path };

    let body = match build_page(&state, lookup).await {
        Ok(body) => body,
        Err(PageError::NotFound(what)) => {
            info!("no page for {}", what);
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => {
            tracing::error!("failed to render {}: {}", path, crate::unpack_error(&e));
            return server_error(APIResponse::new_from_msg("failed to render page"));
        }
    };

    let etag = assets::etag(body.as_bytes());
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());
    if if_none_match == Some(etag.as_str()) {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    Response::builder()
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::ETAG, etag)
        .body(Body::from(body))
        .unwrap()
}
