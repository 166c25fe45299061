//! Shared infrastructure for Modelkit.
//!
//! The model crates only emit `tracing` events and spans. Installing a
//! subscriber is the application's job; [`TracingConfig`] is the standard
//! way to do it.
//!
//! ```no_run
//! use modelkit_core::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::from_env()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//! ```

/// Tracing subscriber configuration.
pub mod tracing_config;

pub use tracing_config::{ParseFormatError, TracingConfig, TracingFormat};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::tracing_config::{TracingConfig, TracingFormat};
}
