use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::AudienceNav;

#[derive(Debug, Deserialize)]
pub struct NavQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct APIResponse {
    pub status: String,
    pub active: Option<String>,
    pub audiences: Vec<AudienceNav>,
    pub badges: Vec<BadgeSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeSnapshot {
    pub url_name: String,
    pub count: u32,
    pub alert: bool,
    pub updated_at: DateTime<Utc>,
}

impl APIResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        return APIResponse {
            status: msg.to_owned(),
            ..Default::default()
        };
    }

    pub fn with_nav(msg: &str, audiences: Vec<AudienceNav>, active: Option<String>) -> Self {
        return APIResponse {
            status: msg.to_owned(),
            active: active,
            audiences: audiences,
            badges: vec![],
        };
    }

    pub fn with_badges(msg: &str, badges: Vec<BadgeSnapshot>) -> Self {
        return APIResponse {
            status: msg.to_owned(),
            badges: badges,
            ..Default::default()
        };
    }
}
