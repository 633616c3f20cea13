//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file)
//!     → args.rs (environment, then command-line flags)
//!     → validation.rs (semantic checks)
//!     → StubConfig (validated, immutable, shared read-only)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server starts
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::StubArgs;
pub use loader::{read_config, ConfigError};
pub use schema::{ContentConfig, ListenerConfig, LogFormat, ObservabilityConfig, StubConfig};
pub use validation::{validate_config, ValidationError};
