pub mod migrate;
pub mod serve;

pub use migrate::run_migrate;
pub use serve::run_serve;

use clap::Args;
use todoctl_server::db::DEFAULT_MAX_CONNECTIONS;

/// Default database when neither flag nor environment provide one
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/todoapp";

/// Database connection arguments shared by all commands
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Maximum connections in the pool
    #[arg(long, env = "TODOCTL_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}
