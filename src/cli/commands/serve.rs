//! Web server command.

use console::style;

use crate::config::Settings;

/// Port used when the bind address names only a host.
const DEFAULT_PORT: u16 = 8000;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: &str, no_migrate: bool) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    if let Err(e) = settings.validate() {
        eprintln!("{} {}", style("✗").red(), e);
        return Err(e.into());
    }
    settings.ensure_directories()?;

    if !no_migrate {
        println!("{} Running database migrations...", style("→").cyan());
        let ctx = settings.create_db_context();
        match ctx.init_schema().await {
            Ok(()) => println!("  {} Database ready", style("✓").green()),
            Err(e) => {
                eprintln!("  {} Migration failed: {}", style("✗").red(), e);
                return Err(anyhow::anyhow!("Database migration failed: {}", e));
            }
        }
    }

    println!(
        "{} Starting {} at http://{}:{}",
        style("→").cyan(),
        settings.app_name,
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8000" -> 127.0.0.1:8000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8000
/// - Host and port: "0.0.0.0:8000" -> 0.0.0.0:8000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("9000").unwrap(),
            ("127.0.0.1".to_string(), 9000)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 8000)
        );
        assert_eq!(
            parse_bind_address("localhost:8080").unwrap(),
            ("localhost".to_string(), 8080)
        );
        assert!(parse_bind_address("  ").is_err());
    }
}
