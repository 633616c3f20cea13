//! Header-driven HTTP stub server library.

pub mod config;
pub mod content;
pub mod http;
pub mod lifecycle;
pub mod observability;

#[cfg(test)]
mod testing;

pub use config::StubConfig;
pub use http::StubServer;
pub use lifecycle::Shutdown;
