use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Makes sure the configured back-office account exists, is active and has staff rights.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let username = &admin.first_superuser_username;
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_username(state.db(), username).await? {
        let password_matches =
            security::verify_password(&admin.first_superuser_password, &user.hashed_password)
                .unwrap_or(false);

        if password_matches && user.is_staff && user.is_active {
            tracing::info!("Default superuser already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            None
        } else {
            Some(security::hash_password(&admin.first_superuser_password)?)
        };

        repositories::users::promote_to_staff(state.db(), &user.id, hashed_password, now).await?;
        tracing::info!(username = %username, "Updated default superuser");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name: "Administrator",
            email: None,
            is_staff: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(username = %username, "Created default superuser");
    Ok(())
}
