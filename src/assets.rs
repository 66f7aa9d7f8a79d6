use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use sha2::{Digest, Sha256};

#[derive(Embed)]
#[folder = "web"]
pub struct Assets;

/// The page shell for a route name, as text. Shells live under
/// `web/pages/<url_name>.html`.
pub fn page(url_name: &str) -> Option<String> {
    let path = format!("pages/{}.html", url_name);
    Assets::get(&path).map(|content| String::from_utf8_lossy(&content.data).into_owned())
}

/// Serves anything under `web/static/` untouched.
pub fn serve_static(rel: &str) -> Response {
    let path = format!("static/{}", rel);
    match Assets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            Response::builder()
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(content.data.into_owned()))
                .unwrap()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Strong ETag over the final bytes; identical output hashes identically,
/// so conditional requests skip the body.
pub fn etag(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_shells_exist_for_builtin_routes() {
        let manifest = crate::model::NavManifest::builtin().unwrap();
        for item in manifest.items() {
            assert!(
                page(&item.url_name).is_some(),
                "missing page shell for {}",
                item.url_name
            );
        }
    }

    #[test]
    fn etag_is_stable_and_quoted() {
        let a = etag(b"same bytes");
        let b = etag(b"same bytes");
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
        assert_ne!(a, etag(b"other bytes"));
    }
}
