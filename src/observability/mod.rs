//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Stages and the synthesizer produce:
//!     → structured events tagged with request_id
//!     → logging.rs (filter, format, stdout)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID appears on every per-request event
//! - RUST_LOG overrides the configured level

pub mod logging;

pub use logging::{init_logging, LoggingError};
