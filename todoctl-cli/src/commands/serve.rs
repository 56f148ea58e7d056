//! HTTP server command
//!
//! Applies migrations, then serves the todo API until Ctrl+C/SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use todoctl_server::db::{create_pool_with_options, migrations};
use todoctl_server::http::server::DEFAULT_CORS_ORIGIN;
use todoctl_server::http::{run_server, ServerConfig};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,

    /// Address to bind to
    #[arg(long, short = 'b', env = "TODOCTL_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Origin allowed to call the API from a browser (repeatable or comma-separated)
    #[arg(
        long = "cors-origin",
        env = "TODOCTL_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_CORS_ORIGIN
    )]
    pub cors_origins: Vec<String>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Don't create tables on start (schema is managed elsewhere)
    #[arg(long)]
    pub skip_migrations: bool,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_origins: self.cors_origins.clone(),
            cors_permissive: self.cors_permissive,
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    tracing::info!("Starting todoctl server on {}", args.bind);

    let pool = create_pool_with_options(&args.db.database_url, args.db.max_connections)
        .await
        .context("Failed to create database pool")?;

    if args.skip_migrations {
        tracing::info!("Skipping migrations");
    } else {
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    // Run server (blocks until shutdown)
    run_server(pool, args.server_config())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_config() {
        let args = ServeArgs::try_parse_from(["serve"]).unwrap();
        let config = args.server_config();
        let defaults = ServerConfig::default();

        assert_eq!(config.bind_addr, defaults.bind_addr);
        assert_eq!(config.cors_origins, defaults.cors_origins);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn comma_separated_origins() {
        let args = ServeArgs::try_parse_from([
            "serve",
            "--cors-origin",
            "http://localhost:4200,https://todo.example.com",
        ])
        .unwrap();
        assert_eq!(
            args.cors_origins,
            vec!["http://localhost:4200", "https://todo.example.com"]
        );
    }

    #[test]
    fn rejects_bad_bind_address() {
        assert!(ServeArgs::try_parse_from(["serve", "--bind", "not-an-addr"]).is_err());
    }
}
