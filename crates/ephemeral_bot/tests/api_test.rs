//! Admin HTTP surface served on a local port.

mod test_utils;

use ephemeral_bot::{AdminState, GuildEntry, MonitorMetrics, admin_router, serve_admin};
use prometheus::Registry;
use std::net::SocketAddr;
use std::time::Duration;
use test_utils::{cache_with, guild};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct Admin {
    addr: SocketAddr,
    stop: watch::Sender<bool>,
    handle: JoinHandle<Result<(), ephemeral_error::HttpError>>,
}

impl Admin {
    async fn start(registry: Registry) -> Self {
        let cache = cache_with(vec![
            guild(1, "small", 3),
            guild(2, "large", 300),
            guild(3, "medium", 30),
        ]);
        let router = admin_router(AdminState::new(cache, registry));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("address");
        let (stop, shutdown) = watch::channel(false);
        let handle = tokio::spawn(serve_admin(
            listener,
            router,
            shutdown,
            Duration::from_secs(5),
        ));
        Self { addr, stop, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::get(self.url(path)).await.expect("request")
    }

    async fn stop(self) {
        self.stop.send(true).expect("server listening");
        self.handle
            .await
            .expect("server task")
            .expect("clean shutdown");
    }
}

#[tokio::test]
async fn test_root_is_empty_ok() {
    let admin = Admin::start(Registry::new()).await;

    let response = admin.get("/").await;
    assert_eq!(response.status(), 200);
    assert!(response.text().await.expect("body").is_empty());

    admin.stop().await;
}

#[tokio::test]
async fn test_guilds_sorted_by_member_count() {
    let admin = Admin::start(Registry::new()).await;

    let response = admin.get("/guilds").await;
    assert_eq!(response.status(), 200);
    let raw: serde_json::Value = response.json().await.expect("json");
    assert_eq!(raw[0]["memberCount"], 300);

    let entries: Vec<GuildEntry> = serde_json::from_value(raw).expect("entries");
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["large", "medium", "small"]);

    admin.stop().await;
}

#[tokio::test]
async fn test_metrics_exposition() {
    let registry = Registry::new();
    let _gauges = MonitorMetrics::new(&registry).expect("gauges");
    let admin = Admin::start(registry).await;

    let response = admin.get("/metrics").await;
    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("body");
    assert!(body.contains("ephemeral_roles_guilds"));
    assert!(body.contains("ephemeral_roles_members"));

    admin.stop().await;
}

#[tokio::test]
async fn test_pprof_profiles() {
    let admin = Admin::start(Registry::new()).await;

    let index = admin.get("/debug/pprof/").await.text().await.expect("body");
    assert!(index.contains("runtime"));
    assert!(index.contains("tasks"));

    let runtime: serde_json::Value = admin
        .get("/debug/pprof/runtime")
        .await
        .json()
        .await
        .expect("json");
    assert!(runtime["workers"].as_u64().is_some());
    assert!(runtime["alive_tasks"].as_u64().is_some());

    assert_eq!(admin.get("/debug/pprof/heap").await.status(), 404);

    admin.stop().await;
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let admin = Admin::start(Registry::new()).await;
    assert_eq!(admin.get("/nope").await.status(), 404);
    admin.stop().await;
}
