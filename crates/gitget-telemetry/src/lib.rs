//! Logging setup for gitget.
//!
//! Logs go to stderr by default so that file contents written to stdout
//! stay clean.
//!
//! # Example
//!
//! ```rust,no_run
//! use gitget_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), gitget_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("gitget_core=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging initialized");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
