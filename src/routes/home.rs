use axum::extract::State;
use axum::http::{header, Uri};
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::sign_in_cookie;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{HomeTemplate, Html, WelcomeTemplate};

#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub name: String,
}

/// GET /: front page with the sign-in form
pub async fn home_page() -> Html<HomeTemplate> {
    Html(HomeTemplate)
}

/// POST /sign-in: make sure a user with this name exists and remember it.
///
/// Not authentication: whoever submits a name becomes that user.
pub async fn sign_in(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> AppResult<Response> {
    let user = state.store.get_or_create_user_by_name(&form.name).await?;
    tracing::info!(
        "Signed in user {} ({:?}), joined {}",
        user.id,
        user.name,
        user.joined_at
    );

    let cookie = sign_in_cookie(&state.config.auth, &user.name);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Html(WelcomeTemplate { name: user.name }),
    )
        .into_response())
}

/// Anything the router doesn't know, including paths under `/` other than `/` itself.
pub async fn not_found(uri: Uri) -> AppError {
    tracing::debug!("No route for {}", uri.path());
    AppError::NotFound
}
