use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread;

use log::{debug, error, info};
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::{Catalog, DexError, Direction, SpeciesSource, resolve_neighbor};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

pub(crate) struct AppState {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) source: Arc<dyn SpeciesSource>,
    pub(crate) sprite_template: Option<String>,
    pub(crate) static_dir: PathBuf,
}

#[derive(Debug)]
pub(crate) struct Reply {
    pub(crate) status: u16,
    pub(crate) content_type: &'static str,
    pub(crate) body: Vec<u8>,
}

impl Reply {
    fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT_TYPE,
            body: value.to_string().into_bytes(),
        }
    }

    fn detail(status: u16, detail: impl Into<String>) -> Self {
        Self::json(status, json!({ "detail": detail.into() }))
    }
}

pub(crate) fn run_server(
    bind: &str,
    port: u16,
    workers: usize,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{bind}:{port}");
    let server = Server::http(&addr)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("server: {e}")))?;
    let server = Arc::new(server);
    let state = Arc::new(state);
    info!(
        "listening on http://{addr} ({} species, {} workers)",
        state.catalog.len(),
        workers.max(1)
    );

    let handles: Vec<_> = (0..workers.max(1))
        .map(|_| {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    serve_one(&state, request);
                }
            })
        })
        .collect();
    for handle in handles {
        if handle.join().is_err() {
            error!("worker thread panicked");
        }
    }
    Ok(())
}

fn serve_one(state: &AppState, request: Request) {
    let reply = handle(state, request.method(), request.url());
    debug!("{} {} -> {}", request.method(), request.url(), reply.status);
    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response.add_header(header);
    }
    if let Err(err) = request.respond(response) {
        debug!("client went away: {err}");
    }
}

pub(crate) fn handle(state: &AppState, method: &Method, url: &str) -> Reply {
    match method {
        Method::Get => route(state, url),
        Method::Head => {
            let mut reply = route(state, url);
            reply.body.clear();
            reply
        }
        _ => Reply::detail(405, "Method Not Allowed"),
    }
}

fn route(state: &AppState, url: &str) -> Reply {
    let path = url.split(['?', '#']).next().unwrap_or("");

    if path == "/" {
        return serve_static(&state.static_dir, "index.html");
    }
    if path == "/health" {
        return Reply::json(200, json!({ "status": "ok", "species": state.catalog.len() }));
    }
    if let Some(rest) = path.strip_prefix("/static/") {
        return serve_static(&state.static_dir, rest);
    }
    for direction in [Direction::Predecessor, Direction::Successor] {
        let prefix = format!("/{}/", direction.label());
        if let Some(raw) = path.strip_prefix(prefix.as_str()) {
            return neighbor_reply(state, raw, direction);
        }
    }
    Reply::detail(404, "Not Found")
}

fn neighbor_reply(state: &AppState, raw: &str, direction: Direction) -> Reply {
    // Undecodable bytes become U+FFFD and simply miss the catalog.
    let bytes = urlencoding::decode_binary(raw.as_bytes());
    let name = String::from_utf8_lossy(&bytes);
    match resolve_neighbor(
        &name,
        direction,
        &state.catalog,
        state.source.as_ref(),
        state.sprite_template.as_deref(),
    ) {
        Ok(result) => Reply::json(200, result.to_json()),
        Err(err @ DexError::NotFound(_)) => Reply::detail(err.status_code(), err.to_string()),
        Err(err) => {
            error!("{} lookup for '{name}' failed: {err}", direction.label());
            Reply::detail(err.status_code(), "internal error")
        }
    }
}

fn serve_static(root: &Path, relative: &str) -> Reply {
    let relative = match urlencoding::decode(relative) {
        Ok(r) => r.into_owned(),
        Err(_) => return Reply::detail(404, "Not Found"),
    };
    let rel_path = Path::new(&relative);
    if relative.is_empty() || !rel_path.components().all(|c| matches!(c, Component::Normal(_))) {
        return Reply::detail(404, "Not Found");
    }
    match fs::read(root.join(rel_path)) {
        Ok(body) => Reply {
            status: 200,
            content_type: content_type_for(rel_path),
            body,
        },
        Err(_) => Reply::detail(404, "Not Found"),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => JSON_CONTENT_TYPE,
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::StubSource;

    fn state_with(static_dir: PathBuf) -> AppState {
        let catalog = Catalog::from_ordered_names(
            ["bulbasaur", "ivysaur", "venusaur", "mr-mime"].map(String::from),
        );
        AppState {
            catalog: Arc::new(catalog),
            source: Arc::new(StubSource::unavailable()),
            sprite_template: Some(crate::DEFAULT_SPRITE_TEMPLATE.to_string()),
            static_dir,
        }
    }

    fn state() -> AppState {
        state_with(PathBuf::from("/nonexistent-static-dir"))
    }

    fn body_json(reply: &Reply) -> serde_json::Value {
        serde_json::from_slice(&reply.body).unwrap()
    }

    #[test]
    fn predecessor_route() {
        let reply = handle(&state(), &Method::Get, "/antecedente/Ivysaur");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, JSON_CONTENT_TYPE);
        let body = body_json(&reply);
        assert_eq!(body["pokemon"], "ivysaur");
        assert_eq!(body["antecedente"], "bulbasaur");
        assert_eq!(body["antecedente_number"], 1);
        assert!(body["sprite"].as_str().unwrap().ends_with("/2.png"));
    }

    #[test]
    fn successor_route_with_encoded_name() {
        let reply = handle(&state(), &Method::Get, "/successore/venusaur?x=1");
        assert_eq!(body_json(&reply)["successore"], "mr-mime");

        let reply = handle(&state(), &Method::Get, "/antecedente/Mr.%20Mime");
        let body = body_json(&reply);
        assert_eq!(body["pokemon"], "mr-mime");
        assert_eq!(body["antecedente"], "venusaur");
    }

    #[test]
    fn boundaries_are_ok_responses() {
        let reply = handle(&state(), &Method::Get, "/antecedente/bulbasaur");
        assert_eq!(reply.status, 200);
        assert!(body_json(&reply)["antecedente"].is_null());

        let reply = handle(&state(), &Method::Get, "/successore/mr-mime");
        assert_eq!(reply.status, 200);
        let body = body_json(&reply);
        assert!(body["successore"].is_null());
        assert_eq!(body["message"], "È l'ultimo Pokémon (#004).");
    }

    #[test]
    fn unknown_name_is_404_with_detail() {
        let reply = handle(&state(), &Method::Get, "/successore/not-a-real-creature");
        assert_eq!(reply.status, 404);
        assert_eq!(
            body_json(&reply)["detail"],
            "Pokémon 'not-a-real-creature' non trovato."
        );
    }

    #[test]
    fn undecodable_name_is_plain_not_found() {
        let reply = handle(&state(), &Method::Get, "/antecedente/%FF");
        assert_eq!(reply.status, 404);
        let detail = body_json(&reply)["detail"].as_str().unwrap().to_string();
        assert!(detail.contains('\u{FFFD}'), "{detail}");

        let reply = handle(&state(), &Method::Get, "/successore/ivy%E2%28saur");
        assert_eq!(reply.status, 404);
    }

    #[test]
    fn head_mirrors_get_without_body() {
        let reply = handle(&state(), &Method::Head, "/antecedente/ivysaur");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, JSON_CONTENT_TYPE);
        assert!(reply.body.is_empty());

        let reply = handle(&state(), &Method::Head, "/successore/not-a-real-creature");
        assert_eq!(reply.status, 404);
        assert!(reply.body.is_empty());
    }

    #[test]
    fn health_and_unknown_routes() {
        let reply = handle(&state(), &Method::Get, "/health");
        assert_eq!(body_json(&reply)["species"], 4);
        assert_eq!(handle(&state(), &Method::Get, "/nope").status, 404);
        assert_eq!(handle(&state(), &Method::Post, "/antecedente/ivysaur").status, 405);
    }

    #[test]
    fn static_files_and_traversal() {
        let dir = std::env::temp_dir().join(format!("pokedex_neighbors_static_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>dex</h1>").unwrap();
        std::fs::write(dir.join("app.js"), "1;").unwrap();
        let state = state_with(dir.clone());

        let home = handle(&state, &Method::Get, "/");
        assert_eq!(home.status, 200);
        assert_eq!(home.body, b"<h1>dex</h1>");
        assert!(home.content_type.starts_with("text/html"));

        let js = handle(&state, &Method::Get, "/static/app.js");
        assert!(js.content_type.starts_with("text/javascript"));

        assert_eq!(handle(&state, &Method::Get, "/static/../Cargo.toml").status, 404);
        assert_eq!(handle(&state, &Method::Get, "/static/%2e%2e/Cargo.toml").status, 404);
        assert_eq!(handle(&state, &Method::Get, "/static/missing.css").status, 404);

        std::fs::remove_dir_all(&dir).ok();
    }
}
