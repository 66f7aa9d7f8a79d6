use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::error::Error;

use crate::api::APIResponse;

pub mod api;
pub mod assets;
pub mod badge;
pub mod config;
pub mod dom;
pub mod error;
pub mod handler;
pub mod highlight;
pub mod model;
pub mod render;
pub mod route;

pub fn server_error(body: APIResponse) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

pub fn bad_request(body: APIResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
