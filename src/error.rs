//! HTTP error handler.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

use crate::application::error::ApplicationError;
use crate::domain::error::DomainError;

pub type Result<T> = std::result::Result<T, ServerError>;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error(transparent)]
    Application(#[from] ApplicationError),
}

/// Plain `{ "message" }` body.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Report a single rejected field.
    pub fn field(mut self, error: &DomainError) -> Self {
        self.errors = Some(vec![FieldError {
            field: error.field().to_owned(),
            message: error.to_string(),
        }]);
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },

            ServerError::Axum(_) => response,

            ServerError::Application(ApplicationError::Domain(err)) => {
                response.field(err)
            },

            ServerError::Application(ApplicationError::InvalidCredentials) => {
                ResponseError::default()
                    .title(INVALID_CREDENTIALS)
                    .status(StatusCode::UNAUTHORIZED)
            },

            ServerError::Application(ApplicationError::DuplicateAccount) => {
                return (
                    StatusCode::CONFLICT,
                    Json(MessageResponse::new(
                        ApplicationError::DuplicateAccount.to_string(),
                    )),
                )
                    .into_response();
            },

            ServerError::Application(err) => {
                tracing::error!(error = %err, source = ?std::error::Error::source(err), "server returned 500 status");

                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;
    use crate::application::error::SignUpStage;
    use crate::domain::identity::IdentityId;
    use crate::domain::role::RoleName;

    async fn render(err: ServerError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let (status, body) =
            render(ApplicationError::InvalidCredentials.into()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["title"], INVALID_CREDENTIALS);
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn test_duplicate_account() {
        let (status, body) =
            render(ApplicationError::DuplicateAccount.into()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, serde_json::json!({ "message": "email already taken" }));
    }

    #[tokio::test]
    async fn test_domain_error_names_field() {
        let (status, body) = render(
            ApplicationError::Domain(DomainError::InvalidEmailFormat).into(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_internal_failures_are_generic() {
        for err in [
            ApplicationError::RoleCatalogCorrupt {
                role: RoleName::User,
            },
            ApplicationError::PartialFailure {
                stage: SignUpStage::IdentityCreated,
                identity_id: IdentityId::new(1),
                profile_id: None,
                source: Box::new(ApplicationError::NotFound),
            },
            ApplicationError::internal(std::io::Error::other("db down")),
        ] {
            let (status, body) = render(err.into()).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["title"], "Internal server error.");
            assert_eq!(body["detail"], "");
        }
    }
}
