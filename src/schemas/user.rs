use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;

#[derive(Debug, Deserialize)]
pub(crate) struct UserLogin {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CandidateCreate {
    #[validate(length(min = 1, max = 150, message = "username must be 1-150 characters"))]
    pub(crate) username: String,
    #[serde(default)]
    #[serde(alias = "fullName")]
    pub(crate) full_name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters long"))]
    pub(crate) password: String,
    #[serde(default)]
    #[serde(alias = "isStaff")]
    pub(crate) is_staff: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) email: Option<String>,
    pub(crate) is_staff: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: crate::db::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            is_staff: user.is_staff,
            is_active: user.is_active,
            created_at: format_primitive(user.created_at),
        }
    }
}
