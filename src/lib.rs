pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod server;
pub mod upstream;

pub use error::{GatewayError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
