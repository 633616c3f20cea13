//! Response body sources.
//!
//! # Data Flow
//! ```text
//! X-Stub-Content: <selector>
//!     → resolver.rs (basename, join under root, confinement check)
//!     → ContentHandle (open file, streamed in chunks)
//!
//! X-Stub-Echo
//!     → body.rs (drain request body into memory, bounded)
//! ```
//!
//! # Design Decisions
//! - Traversal is defeated by taking the final path segment, never by
//!   stripping `..` substrings
//! - Open failures surface as distinct [`ContentError`] variants so the
//!   synthesizer can log the cause before answering 500

pub mod body;
pub mod resolver;

use std::io;
use std::path::PathBuf;

pub use body::buffer_request_body;
pub use resolver::{ContentHandle, ContentResolver};

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content selector {0:?} does not name a file")]
    InvalidSelector(String),

    #[error("content file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied reading {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("{} resolves outside the content root", .0.display())]
    OutsideRoot(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to buffer request body: {0}")]
    Body(#[source] axum::Error),
}

impl ContentError {
    pub(crate) fn from_io(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ContentError::NotFound(path),
            io::ErrorKind::PermissionDenied => ContentError::PermissionDenied(path),
            _ => ContentError::Unreadable { path, source: err },
        }
    }
}
