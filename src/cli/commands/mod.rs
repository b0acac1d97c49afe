//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod create_user;
mod init;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions, DEFAULT_BIND};

#[derive(Parser)]
#[command(name = "docanalysis")]
#[command(about = "Document analysis API: CSV validation, AI document analysis and audit history")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the HTTP API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT
        #[arg(default_value = DEFAULT_BIND)]
        bind: String,

        /// Skip automatic database migration on startup
        #[arg(long)]
        no_migrate: bool,
    },

    /// Create a user account
    CreateUser {
        #[arg(long, default_value = "demo_user")]
        username: String,
        #[arg(long, default_value = "demo_password")]
        password: String,
        #[arg(long, default_value = "demo@example.com")]
        email: String,
        /// Role name (use the upload role to allow CSV uploads)
        #[arg(long, default_value = crate::models::DEFAULT_ROLE)]
        role: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let (settings, _config) = load_settings(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind, no_migrate } => serve::cmd_serve(&settings, &bind, no_migrate).await,
        Commands::CreateUser {
            username,
            password,
            email,
            role,
        } => create_user::cmd_create_user(&settings, &username, &password, &email, &role).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_user_defaults() {
        let cli = Cli::try_parse_from(["docanalysis", "create-user"]).unwrap();
        match cli.command {
            Commands::CreateUser {
                username,
                password,
                email,
                role,
            } => {
                assert_eq!(username, "demo_user");
                assert_eq!(password, "demo_password");
                assert_eq!(email, "demo@example.com");
                assert_eq!(role, "user");
            }
            _ => panic!("expected create-user"),
        }
    }

    #[test]
    fn test_serve_default_bind() {
        let cli = Cli::try_parse_from(["docanalysis", "serve", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { bind, no_migrate } => {
                assert_eq!(bind, "127.0.0.1:8000");
                assert!(!no_migrate);
            }
            _ => panic!("expected serve"),
        }
    }
}
