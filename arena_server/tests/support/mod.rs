// One arena server per test binary, started on first use and shared by every test.
#![allow(dead_code)]

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

/// Start the shared server if needed and return its `http://` base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // The server needs its own runtime: each `#[tokio::test]` runtime ends with its test.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Ephemeral port so parallel test binaries never collide.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                arena_server::run(listener).await.expect("server failed");
            });
        });
        wait_until_accepting(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

/// WebSocket URL for `session_id`, or the default session when `None`.
pub fn ws_url(session_id: Option<&str>) -> String {
    let base = ensure_server().replacen("http://", "ws://", 1);
    match session_id {
        Some(id) => format!("{base}/ws?session_id={id}"),
        None => format!("{base}/ws"),
    }
}

/// POST `/sessions` with `body` and return the raw response.
pub async fn create_session(body: serde_json::Value) -> reqwest::Response {
    let base_url = ensure_server();
    reqwest::Client::new()
        .post(format!("{base_url}/sessions"))
        .json(&body)
        .send()
        .await
        .expect("request should succeed")
}

fn wait_until_accepting(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
