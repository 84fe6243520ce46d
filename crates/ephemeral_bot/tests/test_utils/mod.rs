//! Test utilities for the admin surface and monitors.
//!
//! Provides cache builders and a local stand-in for the listing service.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use ephemeral_bot::{ListingClient, ListingConfig};
use ephemeral_core::{Guild, GuildId, GuildInfo, StateCache, UserId};
use parking_lot::Mutex;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tokio::net::TcpListener;

/// A guild with no roles, channels or cached members.
pub fn guild(id: u64, name: &str, member_count: u64) -> Guild {
    Guild::compose(
        GuildInfo {
            id: GuildId::new(id),
            name: name.to_string(),
            owner_id: UserId::new(1),
            member_count,
        },
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
}

/// A cache holding the given guilds.
pub fn cache_with(guilds: Vec<Guild>) -> Arc<StateCache> {
    let cache = Arc::new(StateCache::new());
    for g in guilds {
        cache.add_guild(g);
    }
    cache
}

/// One request received by [`ListingStub`].
#[derive(Debug, Clone)]
pub struct ListingRequest {
    pub bot_id: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
struct StubState {
    requests: Arc<Mutex<Vec<ListingRequest>>>,
    status: Arc<AtomicU16>,
}

/// Local listing service that records every stats update.
pub struct ListingStub {
    addr: SocketAddr,
    state: StubState,
}

impl ListingStub {
    /// Starts the stub on an ephemeral port, answering 200.
    pub async fn start() -> Self {
        let state = StubState {
            requests: Arc::default(),
            status: Arc::new(AtomicU16::new(200)),
        };
        let router = Router::new()
            .route("/api/bots/:bot_id/stats", post(record))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        Self { addr, state }
    }

    /// Status returned to subsequent requests.
    pub fn respond_with(&self, status: u16) {
        self.state.status.store(status, Ordering::SeqCst);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ListingRequest> {
        self.state.requests.lock().clone()
    }

    /// Credentials pointing at this stub.
    pub fn config(&self) -> ListingConfig {
        ListingConfig {
            base_url: format!("http://{}/api", self.addr),
            bot_id: "4242".to_string(),
            token: "listing-token".to_string(),
        }
    }

    /// A client pointing at this stub.
    pub fn client(&self) -> ListingClient {
        ListingClient::new(self.config()).expect("listing client")
    }
}

async fn record(
    State(state): State<StubState>,
    Path(bot_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.requests.lock().push(ListingRequest {
        bot_id,
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK)
}
