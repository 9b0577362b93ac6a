//! Conversion of gateway errors into HTTP responses

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{error, HttpRequest, HttpResponse, ResponseError};
use tracing::error;

use supabase_common::error::Error;
use supabase_common::types::ApiError;

/// Handler failure carrying a gateway [`Error`]
#[derive(Debug)]
pub struct HandlerError(pub Error);

pub type HandlerResult = std::result::Result<HttpResponse, HandlerError>;

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Error> for HandlerError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.0.error_code(), "Request failed: {}", self.0);
        }

        let mut body = ApiError::new(self.0.to_string());
        if let Some(hint) = self.0.hint() {
            body = body.with_message(hint);
        }
        HttpResponse::build(status).json(body)
    }
}

/// Malformed JSON bodies answer 400 `{ "error": ... }` like every other
/// request failure
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
    error::InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: HandlerError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_rt::test]
    async fn test_missing_field_is_bad_request() {
        let (status, body) = body_of(Error::MissingField("Table name is required").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "Table name is required" }));
    }

    #[actix_rt::test]
    async fn test_remote_error_carries_hint() {
        let err = Error::remote(404, "function execute_sql does not exist").with_hint("create it");
        let (status, body) = body_of(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "function execute_sql does not exist");
        assert_eq!(body["message"], "create it");
    }

    #[actix_rt::test]
    async fn test_transport_error_is_internal() {
        let (status, body) = body_of(Error::Transport("connection refused".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[actix_rt::test]
    async fn test_forbidden() {
        let (status, _) = body_of(Error::Forbidden("read-only".into()).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
