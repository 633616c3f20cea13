//! Content file resolution under a trusted root.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};

use crate::content::ContentError;

const CHUNK_SIZE: usize = 16 * 1024;

/// Maps content selectors to files directly inside one directory.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    root: PathBuf,
}

impl ContentResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path segment of `selector`, with `/` and `\` both treated as
    /// separators.
    pub fn basename(selector: &str) -> Result<&str, ContentError> {
        let name = selector
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        match name {
            "" | "." | ".." => Err(ContentError::InvalidSelector(selector.to_string())),
            name => Ok(name),
        }
    }

    /// Open the file named by `selector` for streaming.
    pub async fn resolve(&self, selector: &str) -> Result<ContentHandle, ContentError> {
        let name = Self::basename(selector)?;
        let path = self.root.join(name);

        let file = File::open(&path)
            .await
            .map_err(|e| ContentError::from_io(path.clone(), e))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| ContentError::from_io(path.clone(), e))?;
        if !metadata.is_file() {
            return Err(ContentError::NotAFile(path));
        }

        // A symlink inside the root may still point elsewhere.
        let canonical_root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| ContentError::from_io(self.root.clone(), e))?;
        let canonical = tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| ContentError::from_io(path.clone(), e))?;
        if !canonical.starts_with(&canonical_root) {
            return Err(ContentError::OutsideRoot(path));
        }

        Ok(ContentHandle::new(file, path, metadata.len()))
    }
}

/// An open content file owned by one request.
///
/// Dropping the handle closes the file.
pub struct ContentHandle {
    file: File,
    path: PathBuf,
    len: u64,
    scratch: Box<[u8]>,
}

impl std::fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHandle")
            .field("path", &self.path)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl ContentHandle {
    fn new(file: File, path: PathBuf, len: u64) -> Self {
        Self {
            file,
            path,
            len,
            scratch: vec![0; CHUNK_SIZE].into_boxed_slice(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size when it was opened.
    pub fn size(&self) -> u64 {
        self.len
    }

    /// Next chunk of the file, or `None` at end of file.
    pub fn poll_chunk(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<Option<Bytes>>> {
        let mut buf = ReadBuf::new(&mut self.scratch);
        ready!(Pin::new(&mut self.file).poll_read(cx, &mut buf))?;

        let filled = buf.filled();
        if filled.is_empty() {
            Poll::Ready(Ok(None))
        } else {
            Poll::Ready(Ok(Some(Bytes::copy_from_slice(filled))))
        }
    }
}
