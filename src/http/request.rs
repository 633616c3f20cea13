//! Request identification.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Keep generation behind a trait so tests can inject predictable ids
//!
//! # Design Decisions
//! - An incoming `X-Request-ID` always wins over a generated one
//! - The id is assigned by the outermost stage so every later log line has it

use uuid::Uuid;

/// Source of fresh request ids.
pub trait IdGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

/// Random UUID v4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
