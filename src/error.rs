use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::db::StoreError;
use crate::views::{render_page, NotFoundTemplate, UserErrorTemplate};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Not found")]
    NotFound,

    /// Input the user can correct; shown inline, never as an error status.
    #[error("{0}")]
    UserError(String),

    #[error("No ID present in path {0}")]
    MissingId(String),

    #[error("Cannot parse ID {0:?}")]
    InvalidId(String),

    #[error("Cannot read cookie: {0}")]
    Cookie(String),

    #[error("Cannot get user {name:?} from database: {source}")]
    CurrentUser {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// The single response shape an error maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotSignedIn,
    NotFound,
    UserError,
    SystemError,
}

impl AppError {
    /// Checked in priority order: a keyed lookup that found nothing,
    /// then caller-correctable input, then everything else.
    pub fn classify(&self) -> ErrorClass {
        match self {
            AppError::NotFound => ErrorClass::NotFound,
            AppError::Store(e) | AppError::CurrentUser { source: e, .. } if e.is_not_found() => {
                ErrorClass::NotFound
            }
            AppError::UserError(_) => ErrorClass::UserError,
            AppError::NotSignedIn => ErrorClass::NotSignedIn,
            _ => ErrorClass::SystemError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.classify() {
            ErrorClass::NotFound => {
                tracing::debug!("Not found: {}", self);
                render_page(StatusCode::NOT_FOUND, &NotFoundTemplate)
            }
            ErrorClass::UserError => {
                let message = self.to_string();
                render_page(StatusCode::OK, &UserErrorTemplate { message })
            }
            ErrorClass::NotSignedIn => Redirect::to("/").into_response(),
            ErrorClass::SystemError => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Trimmed value of a required text field, or a `UserError` carrying `message`.
pub fn require_text(value: &str, message: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::UserError(message.to_string()));
    }
    Ok(trimmed.to_string())
}

/// `UserError` carrying `message` when `condition` holds.
pub fn reject_if(condition: bool, message: &str) -> AppResult<()> {
    if condition {
        return Err(AppError::UserError(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            response_status(AppError::Store(StoreError::NotFound("topic 1".into()))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn user_error_renders_inline() {
        assert_eq!(
            response_status(AppError::UserError("name cannot be blank".into())),
            StatusCode::OK
        );
    }

    #[test]
    fn not_signed_in_redirects_home() {
        let response = AppError::NotSignedIn.into_response();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
    }

    #[test]
    fn system_errors_return_500() {
        for err in [
            AppError::InvalidId("abc".into()),
            AppError::MissingId("/topics".into()),
            AppError::Cookie("bad header".into()),
            AppError::Store(StoreError::Timeout(std::time::Duration::from_secs(1))),
        ] {
            assert_eq!(response_status(err), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn not_found_takes_priority_through_wrapping() {
        let err = AppError::CurrentUser {
            name: "ghost".into(),
            source: StoreError::NotFound("user \"ghost\"".into()),
        };
        assert_eq!(err.classify(), ErrorClass::NotFound);

        let err = AppError::CurrentUser {
            name: "ghost".into(),
            source: StoreError::Timeout(std::time::Duration::from_secs(1)),
        };
        assert_eq!(err.classify(), ErrorClass::SystemError);
    }

    #[test]
    fn require_text_trims_and_rejects_blank() {
        assert_eq!(require_text("  Rust \n", "blank").unwrap(), "Rust");

        let err = require_text(" \t\r\n", "topic name cannot be blank").unwrap_err();
        assert_eq!(err.classify(), ErrorClass::UserError);
        assert_eq!(err.to_string(), "topic name cannot be blank");
    }

    #[test]
    fn reject_if_only_fails_on_condition() {
        assert!(reject_if(false, "nope").is_ok());
        let err = reject_if(true, "nope").unwrap_err();
        assert_eq!(err.classify(), ErrorClass::UserError);
    }
}
