//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, every method and path)
//!     → middleware/ (request id, access log, delay, negotiation)
//!     → response.rs (status, headers, streamed body)
//!     → Send to client
//! ```

pub mod context;
pub mod directives;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use context::{ContentMode, RequestContext};
pub use directives::{DirectiveError, X_REQUEST_ID};
pub use request::{IdGenerator, UuidGenerator};
pub use response::{ResponseDescriptor, ResponseSynthesizer, SynthesisState};
pub use server::StubServer;
