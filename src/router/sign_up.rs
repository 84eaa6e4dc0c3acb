//! Account provisioning.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::application::dto::SignUpRequestDto;
use crate::error::{MessageResponse, Result};
use crate::router::Valid;

pub const REGISTERED: &str = "registered";

#[derive(Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(
        min = 1,
        max = 50,
        message = "First name must contain between 1 and 50 characters."
    ))]
    pub first_name: String,
    #[validate(length(
        min = 1,
        max = 50,
        message = "Last name must contain between 1 and 50 characters."
    ))]
    pub last_name: String,
    #[validate(length(max = 50, message = "Email is too long."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 40,
        message = "Password must contain between 6 and 40 characters."
    ))]
    pub password: String,
}

/// Handler to create an account. Does not sign the caller in.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<MessageResponse>> {
    let confirmation = state
        .auth
        .sign_up(SignUpRequestDto {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
        })
        .await?;

    tracing::debug!(
        identity_id = %confirmation.identity_id,
        profile_id = %confirmation.profile_id,
        "account registered"
    );

    Ok(Json(MessageResponse::new(REGISTERED)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use super::*;
    use crate::*;

    fn body(email: &str, password: &str) -> Body {
        Body {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    async fn sign_up(app: &Router, body: &Body) -> (StatusCode, Value) {
        let response = make_request(
            app.clone(),
            Method::POST,
            "/api/auth/signup",
            json!(body).to_string(),
        )
        .await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_sign_up_handler() {
        let app = app(router::state());

        let (status, body) = sign_up(&app, &body("ann@x.com", "secret1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": REGISTERED }));
    }

    #[tokio::test]
    async fn test_sign_up_duplicate() {
        let app = app(router::state());

        sign_up(&app, &body("ann@x.com", "secret1")).await;
        let (status, body) = sign_up(&app, &body("ann@x.com", "other12")).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "message": "email already taken" }));
    }

    #[tokio::test]
    async fn test_sign_up_with_short_password() {
        let app = app(router::state());

        let (status, body) = sign_up(&app, &body("ann@x.com", "short")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "password");
    }

    #[tokio::test]
    async fn test_sign_up_with_malformed_email() {
        let app = app(router::state());

        let (status, body) = sign_up(&app, &body("ann.x.com", "secret1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_sign_up_with_blank_name() {
        let app = app(router::state());

        let (status, body) = sign_up(
            &app,
            &Body {
                last_name: "   ".into(),
                ..body("ann@x.com", "secret1")
            },
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "lastName");
    }
}
