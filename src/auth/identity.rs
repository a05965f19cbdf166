//! Who is making this request.
//!
//! Identity is a cookie holding the plain username, set at sign-in. It is
//! unsigned and self-asserted: anyone can claim any name by setting the
//! cookie. This is a known simplification, not authentication. Replacing it
//! means issuing an opaque session token backed by a session table; the two
//! schemes must not be mixed.

use axum::http::{header, HeaderMap};
use url::form_urlencoded;

use crate::config::AuthConfig;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// `Set-Cookie` value carrying `name` as the signed-in identity.
pub fn sign_in_cookie(auth: &AuthConfig, name: &str) -> String {
    let max_age_secs = auth.cookie_days * 24 * 3600;
    let value: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        auth.cookie_name, value, max_age_secs
    )
}

/// Raw value of the `name` cookie. Pairs are split on the header bytes so an
/// unrelated cookie with non-ASCII content does not hide this one; only the
/// matching pair has to be valid UTF-8.
fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<Option<&'a str>> {
    for value in headers.get_all(header::COOKIE).iter() {
        for cookie in value.as_bytes().split(|b| *b == b';') {
            let mut split = cookie.splitn(2, |b| *b == b'=');
            let key = split.next().unwrap_or_default().trim_ascii();
            let Some(val) = split.next() else {
                continue;
            };
            if key != name.as_bytes() {
                continue;
            }

            let val = std::str::from_utf8(val.trim_ascii())
                .map_err(|e| AppError::Cookie(format!("cannot get cookie {}: {}", name, e)))?;
            return Ok(Some(val));
        }
    }
    Ok(None)
}

/// Undo `sign_in_cookie`'s form encoding. A literal `&` is kept as part of
/// the value instead of ending it.
fn decode_cookie_value(raw: &str) -> String {
    let raw = raw.trim_matches('"').replace('&', "%26");
    form_urlencoded::parse(format!("v={}", raw).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

/// The signed-in username, or `""` when there is none. Fails only when the
/// cookie header itself cannot be read.
pub fn resolve_signed_in_name(headers: &HeaderMap, cookie_name: &str) -> AppResult<String> {
    Ok(get_cookie_value(headers, cookie_name)?
        .map(decode_cookie_value)
        .unwrap_or_default())
}

/// Look up the signed-in user. Derived fresh from the store on every call.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> AppResult<User> {
    let name = resolve_signed_in_name(headers, &state.config.auth.cookie_name)?;
    if name.is_empty() {
        return Err(AppError::NotSignedIn);
    }

    let found = state.store.get_user_by_name(&name).await;
    found.map_err(|source| AppError::CurrentUser { name, source })
}
