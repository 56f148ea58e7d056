//! todoctl-server: todo and todo-group CRUD over HTTP
//!
//! PostgreSQL is the only source of truth; every request maps to one
//! repository operation that runs as a single atomic unit.

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, DbError};
pub use http::{build_router, run_server, ApiError, ServerConfig, ServerError};
