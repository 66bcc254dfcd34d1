use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use domains::AppError;
use thiserror::Error;

use crate::flash::{self, Flash};
use crate::templates::{ForbiddenTemplate, NotFoundTemplate, ServerErrorTemplate};

/// Everything a handler can fail with. Domain errors bubble up via `From`,
/// the rest is web-layer plumbing.
#[derive(Error, Debug)]
pub enum WebError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("login required")]
    LoginRequired { next: String },

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::App(AppError::NotFound(..)) => {
                error_page(StatusCode::NOT_FOUND, NotFoundTemplate::anonymous())
            }
            WebError::App(AppError::Unauthorized(_)) => {
                error_page(StatusCode::FORBIDDEN, ForbiddenTemplate::anonymous())
            }
            WebError::App(AppError::ValidationError(message)) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            WebError::App(AppError::Conflict(message)) => {
                (StatusCode::CONFLICT, message).into_response()
            }
            WebError::App(AppError::Internal(message)) => {
                tracing::error!(%message, "request failed");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, ServerErrorTemplate::anonymous())
            }
            WebError::LoginRequired { next } => {
                let target = if next.starts_with('/') && next != "/auth/login" {
                    format!("/auth/login?next={next}")
                } else {
                    "/auth/login".to_string()
                };
                let cookie =
                    flash::cookie(&[Flash::warning("Please log in to access this page.")]);
                (
                    AppendHeaders(vec![(header::SET_COOKIE, cookie)]),
                    Redirect::to(&target),
                )
                    .into_response()
            }
            WebError::Render(err) => {
                tracing::error!(error = %err, "template rendering failed");
                error_page(StatusCode::INTERNAL_SERVER_ERROR, ServerErrorTemplate::anonymous())
            }
        }
    }
}

fn error_page(status: StatusCode, template: impl askama::Template) -> Response {
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "error page rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}
