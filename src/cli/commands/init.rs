//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!(
        "{} Initialized {} in {}",
        style("✓").green(),
        settings.app_name,
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.database_url());

    if let Err(e) = settings.validate() {
        println!("{} {}", style("!").yellow(), e);
    }

    Ok(())
}
