//! HTTP layer: routes, session cookies, asset dispatch
//!
//! Three routes plus a static-file fallback:
//!
//! - `GET /` issues session credentials on first contact and serves the
//!   HTML shell.
//! - `GET /assets/*path` dispatches on extension: `.js` requires an
//!   established session secret and runs the JS pipeline, `.css` runs
//!   the stylesheet pipeline, anything else is not found.
//! - `GET /api/extract` checks the caller's secret against the session
//!   and delegates to the extraction collaborator.
//!
//! Every pipeline failure surfaces as the uniform not-found response;
//! the distinction between failure kinds lives in the logs only.

use crate::config::Config;
use crate::error::PressroomError;
use crate::extract::Extractor;
use crate::pipeline::inject::inject_token;
use crate::pipeline::AssetPipeline;
use crate::session::SessionStore;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Session cookie; HttpOnly, identifies the server-side session record.
const SESSION_COOKIE: &str = "pressroom.sid";

/// Non-secret client tag cookie, readable by the page.
const CLIENT_ID_COOKIE: &str = "clientId";

/// Placeholder in the HTML shell replaced with the client id.
const CLIENT_ID_PLACEHOLDER: &str = "__clientId__";

/// Shared server state, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AssetPipeline>,
    pub sessions: Arc<SessionStore>,
    pub extractor: Arc<dyn Extractor>,
    pub index_html: PathBuf,
    pub static_root: PathBuf,
    pub cookie_max_age: Duration,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/assets/*path", get(asset))
        .route("/api/extract", get(extract))
        .fallback(static_file)
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(config: &Config, state: AppState) -> crate::error::PressroomResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| PressroomError::io(format!("binding {addr}"), e))?;

    info!("Server started at http://{addr}");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| PressroomError::io("serving HTTP", e))
}

/// `GET /` — ensure credentials exist, serve the templated shell.
async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookies = parse_cookies(&headers);
    let session = state
        .sessions
        .get_or_create(cookies.get(SESSION_COOKIE).map(String::as_str));
    let Some(credentials) = state.sessions.ensure_credentials(&session.id) else {
        error!(session = %session.id, "Session vanished during credential issue");
        return not_found();
    };

    let html = match tokio::fs::read_to_string(&state.index_html).await {
        Ok(html) => html,
        Err(e) => {
            error!("Failed to read {}: {e}", state.index_html.display());
            return not_found();
        }
    };

    // The shell consumes both credential halves through the same
    // whole-token substitution contract the JS pipeline uses.
    let html = inject_token(&html, CLIENT_ID_PLACEHOLDER, &credentials.client_id);
    let html = crate::pipeline::inject::inject_secret(&html, &credentials.client_secret);

    let max_age = state.cookie_max_age.as_secs();
    let mut response = Html(html).into_response();
    append_cookie(
        &mut response,
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}", session.id),
    );
    append_cookie(
        &mut response,
        format!("{CLIENT_ID_COOKIE}={}; Path=/; SameSite=Lax; Max-Age={max_age}", credentials.client_id),
    );
    response
}

/// `GET /assets/*path` — compile and serve one asset.
async fn asset(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    if path.ends_with(".js") {
        // Precondition, not a build failure: without a session secret
        // the placeholder would ship unsubstituted and break the
        // extraction handshake, so the pipeline must not even start.
        let cookies = parse_cookies(&headers);
        let credentials = cookies
            .get(SESSION_COOKIE)
            .and_then(|sid| state.sessions.credentials(sid));
        let Some(credentials) = credentials else {
            warn!(asset = %path, "{}", PressroomError::MissingCredential);
            return not_found();
        };

        return match state.pipeline.build_js(&path, &credentials.client_secret).await {
            Ok(bundle) => ([(header::CONTENT_TYPE, "text/javascript")], bundle).into_response(),
            Err(e) => {
                log_build_failure(&path, &e);
                not_found()
            }
        };
    }

    if path.ends_with(".css") {
        return match state.pipeline.build_css(&path).await {
            Ok(css) => ([(header::CONTENT_TYPE, "text/css")], css).into_response(),
            Err(e) => {
                log_build_failure(&path, &e);
                not_found()
            }
        };
    }

    warn!(asset = %path, "Unsupported asset extension");
    not_found()
}

fn log_build_failure(path: &str, e: &PressroomError) {
    if e.is_pipeline_defect() {
        error!(asset = %path, "Asset build failed: {e}");
    } else {
        warn!(asset = %path, "Asset unavailable: {e}");
    }
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    url: String,
    #[serde(rename = "clientSecret")]
    client_secret: Option<String>,
}

/// `GET /api/extract` — verify the session secret, then delegate.
///
/// The secret arrives from code this server compiled into the session's
/// own bundle, so a matching value is a same-origin signal.
async fn extract(
    State(state): State<AppState>,
    Query(query): Query<ExtractQuery>,
    headers: HeaderMap,
) -> Response {
    let cookies = parse_cookies(&headers);
    let credentials = cookies
        .get(SESSION_COOKIE)
        .and_then(|sid| state.sessions.credentials(sid));

    let authorized = matches!(
        (&credentials, &query.client_secret),
        (Some(c), Some(presented)) if &c.client_secret == presented
    );
    if !authorized {
        warn!("Extraction request with missing or mismatched credentials");
        return Json(json!({
            "error": true,
            "errorType": "credentials",
            "message": "Invalid or expired session credentials. Reload the page.",
        }))
        .into_response();
    }

    match state.extractor.extract(&query.url).await {
        Ok(article) => Json(json!({ "error": false, "article": article })).into_response(),
        Err(e) => {
            warn!(url = %query.url, "Extraction failed: {e}");
            Json(json!({
                "error": true,
                "errorType": "parser",
                "message": e.to_string(),
            }))
            .into_response()
        }
    }
}

/// Fallback: serve files under the static root as-is, when present.
async fn static_file(State(state): State<AppState>, uri: Uri) -> Response {
    let rel = uri.path().trim_start_matches('/');
    if rel.is_empty() || rel.contains("..") || rel.contains('\\') {
        return not_found();
    }

    let path = state.static_root.join(rel);
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type_for(rel))], bytes).into_response(),
        Err(_) => not_found(),
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => "text/html",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn append_cookie(response: &mut Response, cookie: String) {
    if let Ok(value) = cookie.parse() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Parse the request `Cookie` header into a name→value map.
fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|raw| {
            raw.split(';')
                .filter_map(|pair| {
                    let (name, value) = pair.split_once('=')?;
                    Some((name.trim().to_string(), value.trim().to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}
