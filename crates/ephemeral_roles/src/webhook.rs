//! Forwards warnings and errors to a Discord webhook.
//!
//! The layer never blocks the logging call site: events are rendered to a string
//! and pushed onto a bounded channel; when the channel is full the event is dropped.
//! A background task drains the channel and posts each entry. Delivery failures go
//! to stderr, since logging them would feed back into this layer.

use serde_json::json;
use std::fmt::{self, Write as _};
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Queue depth between the layer and the delivery task.
pub const WEBHOOK_QUEUE: usize = 256;

/// Discord rejects message content longer than this.
const MAX_CONTENT: usize = 2000;

// The HTTP stack's own warnings would loop through the webhook.
const IGNORED_TARGETS: &[&str] = &["reqwest", "hyper", "h2", "rustls"];

/// A `tracing` layer that queues WARN and ERROR events for the webhook.
#[derive(Debug, Clone)]
pub struct WebhookLayer {
    tx: mpsc::Sender<String>,
}

impl WebhookLayer {
    /// A layer and the receiving end its events are queued on.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[derive(Default)]
struct ContentVisitor {
    message: String,
    fields: String,
}

impl Visit for ContentVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Renders an event as webhook message content.
fn render(level: &Level, target: &str, visitor: ContentVisitor) -> String {
    let mut content = format!("**{level}** `{target}` {}{}", visitor.message, visitor.fields);
    if content.len() > MAX_CONTENT {
        let mut end = MAX_CONTENT;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        content.truncate(end);
    }
    content
}

impl<S: Subscriber> Layer<S> for WebhookLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // More verbose levels compare greater.
        if *metadata.level() > Level::WARN {
            return;
        }
        let target = metadata.target();
        if IGNORED_TARGETS.iter().any(|t| target.starts_with(t)) {
            return;
        }

        let mut visitor = ContentVisitor::default();
        event.record(&mut visitor);
        // Full or closed: drop the event.
        let _ = self.tx.try_send(render(metadata.level(), target, visitor));
    }
}

/// Posts every queued entry to `url` until all senders are gone.
pub async fn forward_to_webhook(
    client: reqwest::Client,
    url: String,
    mut rx: mpsc::Receiver<String>,
) {
    while let Some(content) = rx.recv().await {
        let delivered = client
            .post(&url)
            .json(&json!({ "content": content }))
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(e) = delivered {
            eprintln!("log webhook delivery failed: {e}");
        }
    }
}
