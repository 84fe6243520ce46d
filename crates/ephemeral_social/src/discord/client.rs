//! Discord gateway client setup and lifecycle management.

use super::{EphemeralHandler, platform_error};
use ephemeral_error::PlatformResult;
use serenity::Client;
use serenity::gateway::ShardManager;
use std::sync::Arc;
use tracing::{info, instrument};

/// Shared handle used to close every shard from outside the client.
pub type ShardManagerHandle = Arc<ShardManager>;

/// The Discord gateway client.
///
/// # Example
/// ```no_run
/// # async fn run(handler: ephemeral_social::EphemeralHandler) -> ephemeral_error::PlatformResult<()> {
/// use ephemeral_social::EphemeralBot;
///
/// let token = std::env::var("BOT_TOKEN").unwrap_or_default();
/// let mut bot = EphemeralBot::new(&token, handler).await?;
/// let shards = bot.shard_manager();
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     shards.shutdown_all().await;
/// });
/// bot.start(1).await?;
/// # Ok(())
/// # }
/// ```
pub struct EphemeralBot {
    client: Client,
}

impl EphemeralBot {
    /// Build the gateway client.
    ///
    /// # Errors
    /// Returns an error if the token is malformed or the client fails to initialize.
    #[instrument(skip(token, handler), fields(token_len = token.len()))]
    pub async fn new(token: &str, handler: EphemeralHandler) -> PlatformResult<Self> {
        let intents = EphemeralHandler::intents();
        info!(?intents, "Building Discord client");

        let client = Client::builder(token, intents)
            .event_handler(handler)
            .await
            .map_err(platform_error)?;

        Ok(Self { client })
    }

    /// Handle for closing the connection.
    pub fn shard_manager(&self) -> ShardManagerHandle {
        Arc::clone(&self.client.shard_manager)
    }

    /// Open `shards` gateway connections and dispatch events until they close.
    ///
    /// # Errors
    /// Returns an error if the gateway cannot be reached or rejects the session.
    #[instrument(skip(self))]
    pub async fn start(&mut self, shards: u32) -> PlatformResult<()> {
        info!("Connecting to the Discord gateway");
        self.client
            .start_shards(shards)
            .await
            .map_err(platform_error)?;
        info!("Discord gateway connection closed");
        Ok(())
    }
}
