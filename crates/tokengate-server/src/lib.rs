pub mod config;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{ServerBuilder, TokengateServer, build_app, build_router, create_session_store};
