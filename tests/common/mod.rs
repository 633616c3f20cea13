//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;

use rest_stub::{Shutdown, StubConfig, StubServer};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Fresh content root, removed when the returned guard drops.
pub fn content_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("rest-stub-it-")
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

/// Start a stub server on an ephemeral port serving content from `root`.
///
/// Trigger the returned [`Shutdown`] to stop it.
pub async fn start_stub_server(root: &Path) -> (SocketAddr, Shutdown) {
    let mut config = StubConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.content.root = root.to_path_buf();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        StubServer::new(config).run(listener, receiver).await.unwrap();
    });

    (addr, shutdown)
}
