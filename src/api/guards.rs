use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::repositories;

const INVALID_CREDENTIALS: &str = "Invalid authentication credentials";

/// An authenticated, active account. Candidates and staff both pass.
pub(crate) struct CurrentUser(pub(crate) User);

/// An authenticated staff account, for the back office.
pub(crate) struct CurrentAdmin(pub(crate) User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;
        let claims = security::verify_token(token, state.settings()).map_err(|err| {
            tracing::debug!(error = %err, "Rejected access token");
            ApiError::Unauthorized(INVALID_CREDENTIALS)
        })?;

        match repositories::users::find_by_id(state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        {
            Some(user) if user.is_active => Ok(CurrentUser(user)),
            Some(_) => Err(ApiError::Unauthorized(INVALID_CREDENTIALS)),
            None => Err(ApiError::Unauthorized("User not found")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            tracing::warn!(user_id = %user.id, "Non-staff account hit the back office");
            return Err(ApiError::Forbidden("Staff access required"));
        }
        Ok(CurrentAdmin(user))
    }
}
