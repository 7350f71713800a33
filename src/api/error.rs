// src/api/error.rs
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;

use crate::errors::EvalError;

/// Body of every non-2xx reply.
#[derive(Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ResponseError for EvalError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorDetail {
            detail: self.to_string(),
        })
    }
}

/// Rejects undecodable request bodies with the same `{detail}` shape.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorDetail {
        detail: format!("Invalid request body: {}", err),
    });
    InternalError::from_response(err, response).into()
}
