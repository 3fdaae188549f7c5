//! stswap application: bootstrap and glue around the core workflow.
//!
//! Wires the RPC wallet provider, session manager, balance tracker and
//! purchase flow together behind a minimal line-driven front end. All
//! sequencing logic lives in the component crates; this one only
//! routes events and commands.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_logging;
