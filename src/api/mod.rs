// HTTP API routes: the game page, guesses, health and metrics.

use std::path::PathBuf;
use std::time::Instant;

use axum::{
    extract::{FromRef, FromRequest, Json, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha512};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::error::StoreError;
use crate::metrics;
use crate::session::SessionManager;

/// Name of the signed cookie holding the game session id.
pub const SESSION_COOKIE: &str = "bulls_session";

const INDEX_HTML: &str = include_str!("../../static/index.html");

// ── Request types ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct GuessRequest {
    /// A missing field is an empty guess, which fails validation.
    #[serde(default)]
    pub guess: String,
}

/// Guess body accepted either as JSON or as an urlencoded form.
#[derive(Debug)]
pub struct GuessBody(pub GuessRequest);

impl<S> FromRequest<S> for GuessBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(body) = Form::<GuessRequest>::from_request(req, state)
                .await
                .map_err(|e| json_error(StatusCode::BAD_REQUEST, &e.body_text()).into_response())?;
            Ok(GuessBody(body))
        } else {
            let Json(body) = Json::<GuessRequest>::from_request(req, state)
                .await
                .map_err(|e| json_error(e.status(), &e.body_text()).into_response())?;
            Ok(GuessBody(body))
        }
    }
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(sessions: SessionManager, session_secret: Option<&str>) -> Self {
        Self {
            sessions,
            cookie_key: cookie_key(session_secret),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie signing key from a configured secret, or make a random
/// one for this process.
pub fn cookie_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) => Key::from(Sha512::digest(secret.as_bytes()).as_slice()),
        None => Key::generate(),
    }
}

// ── Error helper ──────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: StoreError) -> impl IntoResponse {
    tracing::error!("Session store error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/guess", post(submit_guess))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler));

    app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.route("/", get(index)),
    };

    app.with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(CorsLayer::permissive())
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let start = Instant::now();

    let response = next.run(req).await;

    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint, response.status().as_str()])
        .inc();
    metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(start.elapsed().as_secs_f64());
    response
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn submit_guess(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    GuessBody(req): GuessBody,
) -> Response {
    let current = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());

    match state
        .sessions
        .submit_guess(current.as_deref(), &req.guess)
        .await
    {
        Ok(outcome) => {
            let jar = sync_session_cookie(jar, current.as_deref(), outcome.session.as_deref());
            (jar, Json(outcome.reply)).into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

/// Bring the cookie in line with the token the session manager wants kept.
fn sync_session_cookie(
    jar: SignedCookieJar,
    current: Option<&str>,
    next: Option<&str>,
) -> SignedCookieJar {
    match next {
        Some(id) if current != Some(id) => jar.add(
            Cookie::build((SESSION_COOKIE, id.to_owned()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        ),
        Some(_) => jar,
        None if current.is_some() => jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        None => jar,
    }
}

async fn health_check(State(state): State<AppState>) -> Response {
    match state.sessions.store().count().await {
        Ok(n) => Json(json!({
            "status": "ok",
            "service": "bulls-backend",
            "active_sessions": n,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "service": "bulls-backend" })),
            )
                .into_response()
        }
    }
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_key_is_stable_for_a_secret() {
        let a = cookie_key(Some("correct horse"));
        let b = cookie_key(Some("correct horse"));
        let c = cookie_key(Some("battery staple"));
        assert_eq!(a.master(), b.master());
        assert_ne!(a.master(), c.master());
    }

    #[test]
    fn test_random_cookie_keys_differ() {
        assert_ne!(cookie_key(None).master(), cookie_key(None).master());
    }
}
