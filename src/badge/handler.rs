use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::info;

use crate::api::{APIResponse, BadgeSnapshot};
use crate::bad_request;
use crate::handler::AppState;
use crate::model::Badge;

#[derive(Debug, Clone)]
pub struct BadgeEntry {
    pub badge: Badge,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct BadgeBoard {
    entries: HashMap<String, BadgeEntry>,
}

impl BadgeBoard {
    pub fn new() -> Self {
        BadgeBoard {
            entries: HashMap::new(),
        }
    }

    pub fn set(&mut self, url_name: &str, badge: Badge) {
        self.set_at(url_name, badge, Utc::now());
    }

    fn set_at(&mut self, url_name: &str, badge: Badge, at: DateTime<Utc>) {
        self.entries.insert(
            url_name.to_string(),
            BadgeEntry {
                badge,
                updated_at: at,
            },
        );
    }

    /// Entries fresher than the TTL, keyed by route name — the renderer's
    /// input shape.
    pub fn live(&self, ttl: Duration) -> HashMap<String, Badge> {
        let cutoff = Utc::now() - ttl;
        self.entries
            .iter()
            .filter(|(_, entry)| entry.updated_at >= cutoff)
            .map(|(name, entry)| (name.clone(), entry.badge))
            .collect()
    }

    /// Drops entries past the TTL, returning how many went.
    pub fn sweep(&mut self, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.updated_at >= cutoff);
        before - self.entries.len()
    }

    pub fn snapshot(&self) -> Vec<BadgeSnapshot> {
        let mut badges: Vec<BadgeSnapshot> = self
            .entries
            .iter()
            .map(|(name, entry)| BadgeSnapshot {
                url_name: name.clone(),
                count: entry.badge.count,
                alert: entry.badge.alert,
                updated_at: entry.updated_at,
            })
            .collect();
        badges.sort_by(|a, b| a.url_name.cmp(&b.url_name));
        badges
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct BadgePush {
    pub url_name: String,
    pub count: u32,
    #[serde(default)]
    pub alert: bool,
}

pub async fn get_badges(State(state): State<AppState>) -> Response {
    let board = state.badges.read().await;
    let response = APIResponse::with_badges("ok", board.snapshot());
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn push_badge(State(state): State<AppState>, Json(push): Json<BadgePush>) -> Response {
    if !state.nav.contains_route(&push.url_name) {
        info!("rejected badge for unknown route {}", push.url_name);
        return bad_request(APIResponse::new_from_msg("unknown url_name"));
    }

    let mut board = state.badges.write().await;
    board.set(
        &push.url_name,
        Badge {
            count: push.count,
            alert: push.alert,
        },
    );

    info!("badge updated. route: {}, count: {}", push.url_name, push.count);
    (StatusCode::OK, Json(APIResponse::new_from_msg("badge updated"))).into_response()
}
