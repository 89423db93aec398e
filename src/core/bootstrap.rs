use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Makes sure the configured first admin can always log in. Without at
/// least one admin the whole management surface is unreachable.
pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping first admin creation");
        return Ok(());
    }

    let email = &admin.first_admin_email;
    let existing = repositories::admins::find_by_email(state.db(), email).await?;
    let now = primitive_now_utc();

    if let Some(existing) = existing {
        let password_matches =
            security::verify_password(&admin.first_admin_password, &existing.hashed_password)
                .unwrap_or(false);

        if password_matches && existing.is_active {
            tracing::info!("First admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            existing.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_admin_password)?
        };

        repositories::admins::reset_credentials(state.db(), &existing.id, &hashed_password, now)
            .await?;
        tracing::info!("Updated first admin {email}");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;
    repositories::admins::create(
        state.db(),
        repositories::admins::CreateAdmin {
            id: &Uuid::new_v4().to_string(),
            email,
            hashed_password,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!("Created first admin {email}");
    Ok(())
}
