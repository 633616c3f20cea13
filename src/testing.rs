//! Shared unit-test fixtures.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

/// Fresh content root, removed when the returned guard drops.
pub fn content_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("rest-stub-")
        .tempdir()
        .unwrap()
}

pub trait ContentDirExt {
    fn write(&self, name: &str, contents: &[u8]);
}

impl ContentDirExt for TempDir {
    fn write(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.path().join(name), contents).unwrap();
    }
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// A JSON subscriber writing into this buffer.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let buffer = self.clone();
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || buffer.clone())
            .finish()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
