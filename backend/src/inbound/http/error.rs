//! HTTP rendering of domain errors.
//!
//! Domain errors stay transport agnostic; this module maps each
//! [`ErrorCode`] to a status, renders the JSON failure envelope and echoes the
//! trace identifier as a header. Extractor failures (bad JSON, bad query
//! strings, bad path segments) are folded into `invalid_request` so every
//! failure shares one shape.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use tracing::{debug, error};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Message returned in place of internal failure details.
const REDACTED_MESSAGE: &str = "Internal server error";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Internal errors keep their fixed user-facing message but never expose
/// structured details.
fn public_view(error: &Error) -> Error {
    if error.code() == ErrorCode::InternalError {
        error.clone().without_details()
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(public_view(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Self::internal(REDACTED_MESSAGE)
    }
}

fn invalid_request(reason: impl std::fmt::Display) -> actix_web::Error {
    debug!(%reason, "rejected malformed request");
    Error::invalid_request(reason.to_string()).into()
}

/// `JsonConfig` error handler rendering body failures as `invalid_request`.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    invalid_request(format!("Invalid JSON body: {err}"))
}

/// `QueryConfig` error handler rendering query failures as `invalid_request`.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    invalid_request(format!("Invalid query string: {err}"))
}

/// `PathConfig` error handler rendering path failures as `invalid_request`.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    invalid_request(format!("Invalid path: {err}"))
}

/// Extractor configuration shared by the application and handler tests.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler));
}

#[cfg(test)]
mod tests;
