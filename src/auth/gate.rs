use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::identity::resolve_signed_in_name;
use crate::state::AppState;

/// Middleware that only lets signed-in requests through.
///
/// A cookie that cannot be read is answered with a 500 and an absent
/// identity with a redirect home. In both cases the wrapped handler never
/// runs.
pub async fn require_sign_in(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let name = match resolve_signed_in_name(request.headers(), &state.config.auth.cookie_name) {
        Ok(name) => name,
        Err(e) => return e.into_response(),
    };

    if name.is_empty() {
        tracing::debug!("Not signed in, redirecting {} to /", request.uri().path());
        return Redirect::to("/").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, HeaderValue, StatusCode};
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::config::{Config, DatabaseConfig};
    use crate::db::{self, SqliteForumRepository};

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let config = DatabaseConfig {
            path: dir.path().join("forum.db"),
            ..DatabaseConfig::default()
        };
        let pool = db::create_pool(&config).unwrap();
        AppState {
            store: Arc::new(SqliteForumRepository::new(pool, Duration::from_secs(5))),
            config: Config::default(),
        }
    }

    fn gated_app(state: AppState, calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/secret",
                get(move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        "secret"
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_sign_in,
            ))
            .with_state(state)
    }

    fn request(cookie: Option<HeaderValue>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/secret");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn signed_in_request_reaches_handler() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = gated_app(test_state(&tmp), calls.clone());

        let response = app
            .oneshot(request(Some(HeaderValue::from_static("name=alice"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_identity_redirects_without_running_handler() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = gated_app(test_state(&tmp), calls.clone());

        let response = app.oneshot(request(None)).await.unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_identity_redirects() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = gated_app(test_state(&tmp), calls.clone());

        let response = app
            .oneshot(request(Some(HeaderValue::from_static("name="))))
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_cookie_fails_without_running_handler() {
        let tmp = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = gated_app(test_state(&tmp), calls.clone());

        let cookie = HeaderValue::from_bytes(b"name=caf\xe9").unwrap();
        let response = app.oneshot(request(Some(cookie))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
