//! Create-user command.

use console::style;

use crate::config::Settings;
use crate::models::NewUser;

/// Create a user unless the username is already taken.
pub async fn cmd_create_user(
    settings: &Settings,
    username: &str,
    password: &str,
    email: &str,
    role: &str,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let users = ctx.users();

    if let Some(existing) = users.get_by_username(username).await? {
        println!(
            "{} User '{}' already exists (id {})",
            style("!").yellow(),
            existing.username,
            existing.id
        );
        return Ok(());
    }

    let hasher = settings.password_hasher();
    let owned = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hasher.hash_password(&owned)).await??;

    let user = users
        .create(&NewUser::new(username, email, hash).with_role(role))
        .await?;

    println!(
        "{} Created user '{}' (id {}, role {})",
        style("✓").green(),
        user.username,
        user.id,
        user.role
    );
    Ok(())
}
