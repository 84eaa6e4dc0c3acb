//! Credential sign-in.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::application::dto::SignInRequestDto;
use crate::domain::identity::IdentityId;
use crate::error::Result;

/// Missing fields are treated like wrong credentials.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub email: String,
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub principal_id: IdentityId,
    pub principal_name: String,
    pub roles: Vec<String>,
}

/// Handler to exchange credentials for a session token.
pub async fn handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Body>, JsonRejection>,
) -> Result<Json<Response>> {
    let Json(body) = body?;

    let session = state
        .auth
        .sign_in(SignInRequestDto {
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(Response {
        token: session.token,
        token_type: session.token_type,
        expires_in: session.expires_in,
        principal_id: session.principal.id,
        principal_name: session.principal.name,
        roles: session.principal.roles,
    }))
}
