//! Shared test support: an in-process mock of the gallery API and a
//! throwaway credential store.

use axum::Router;
use tokio::net::TcpListener;

use crate::auth::CredentialStore;

/// Serve `router` on an ephemeral localhost port and return the base URL.
/// The server task is dropped with the runtime at the end of the test.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock server");
    let addr = listener.local_addr().expect("failed to read mock server addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server failed");
    });
    format!("http://{}", addr)
}

/// A credential store rooted in a fresh temp directory. Keep the returned
/// `TempDir` alive for the duration of the test.
pub fn temp_store() -> (tempfile::TempDir, CredentialStore) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = CredentialStore::new(dir.path().to_path_buf()).expect("failed to open store");
    (dir, store)
}
