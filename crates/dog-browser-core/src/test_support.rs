// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Shared test helpers

use axum::http::{StatusCode, Uri};
use axum::Router;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fresh, empty directory under the system temp dir
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dog-browser-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// In-process stand-in for the dog API, answering canned bodies by path
pub struct MockApi {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl MockApi {
    pub async fn start(routes: &[(&str, u16, &str)]) -> Self {
        let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
            routes
                .iter()
                .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
                .collect(),
        );
        let hits = Arc::new(AtomicUsize::new(0));

        let handler_hits = hits.clone();
        let app = Router::new().fallback(move |uri: Uri| {
            let routes = routes.clone();
            let hits = handler_hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                match routes.get(uri.path()) {
                    Some((status, body)) => (
                        StatusCode::from_u16(*status).unwrap(),
                        body.clone(),
                    ),
                    None => (
                        StatusCode::NOT_FOUND,
                        format!("Unexpected request: {}", uri),
                    ),
                }
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/", addr),
            hits,
        }
    }

    /// Number of requests served so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn images_body(images: &[&str]) -> String {
    serde_json::json!({ "message": images, "status": "success" }).to_string()
}
