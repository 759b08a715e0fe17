//! static file serving for the UI bundle: an extension allowlist doubles as
//! the `Content-Type` table, `..` is rejected outright, and a missing file
//! is a 404 rather than an empty body.
//!
//! grounded on `minesweeper-server.cc`'s `serve_file`: reject `..` in the
//! path (400), look up the extension in a fixed MIME table or refuse it
//! (403 — the original comment notes it deliberately won't fall back to
//! `application/octet-stream` for unknown types), then 404 if the resolved
//! path doesn't exist.

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use std::path::{Path, PathBuf};

pub struct DocRoot(pub PathBuf);

fn content_type(ext: &str) -> Option<&'static str> {
    Some(match ext {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "txt" => "text/plain; charset=utf-8",
        _ => return None,
    })
}

pub async fn serve_static(req: HttpRequest, root: web::Data<DocRoot>) -> impl Responder {
    let requested = req.path().trim_start_matches('/');
    let requested = if requested.is_empty() { "index.html" } else { requested };

    if requested.contains("..") {
        return HttpResponse::BadRequest().body("bad request");
    }

    let path: &Path = requested.as_ref();
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return HttpResponse::Forbidden().body("forbidden");
    };
    let Some(mime) = content_type(ext) else {
        return HttpResponse::Forbidden().body("forbidden");
    };

    let full = root.0.join(path);
    match tokio::fs::read(&full).await {
        Ok(bytes) => HttpResponse::Ok().content_type(mime).body(bytes),
        Err(_) => HttpResponse::NotFound().body("not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_resolve_a_content_type() {
        assert_eq!(content_type("html"), Some("text/html; charset=utf-8"));
        assert_eq!(content_type("js"), Some("application/javascript; charset=utf-8"));
    }

    #[test]
    fn unknown_extensions_are_rejected_rather_than_defaulted() {
        assert_eq!(content_type("exe"), None);
        assert_eq!(content_type(""), None);
    }
}
