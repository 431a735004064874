//! Bot layer - Discord-specific interface.
//!
//! Wires the interactive message core to serenity: the HTTP transport, gateway event
//! routing and the poise framework with its commands.

/// Discord command implementations
pub mod commands;
/// Gateway event handlers
pub mod handlers;
/// Serenity-backed message transport
pub mod transport;

use crate::{
    config::Settings,
    errors::{Error, Result},
    interactive::{InteractiveMessageHandler, MessageOptions, MessageTransport},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub use transport::SerenityTransport;

/// Shared data available to all bot commands and event handlers.
pub struct BotData {
    /// Registry of live interactive messages
    pub handler: InteractiveMessageHandler,
    /// Transport interactive messages are sent through
    pub transport: Arc<dyn MessageTransport>,
    /// Loaded configuration
    pub settings: Arc<Settings>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub fn new(
        handler: InteractiveMessageHandler,
        transport: Arc<dyn MessageTransport>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            handler,
            transport,
            settings,
        }
    }

    /// Message options seeded from the `[interactive]` settings.
    #[must_use]
    pub fn message_options(&self) -> MessageOptions {
        MessageOptions::from_settings(&self.settings.interactive)
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("An error occurred: {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Builds the poise framework and runs the client until it stops.
#[instrument(skip(token, settings, handler))]
pub async fn run_bot(
    token: String,
    settings: Arc<Settings>,
    handler: InteractiveMessageHandler,
) -> Result<()> {
    let dev_guild = settings
        .bot
        .dev_guild_id
        .filter(|id| *id != 0)
        .map(serenity::GuildId::new);
    let prefix = settings.bot.prefix.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![commands::ping(), commands::help()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                if let Some(guild_id) = dev_guild {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!("Registered commands in guild {}", guild_id);
                } else {
                    info!("Registering commands globally...");
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }
                let transport: Arc<dyn MessageTransport> =
                    Arc::new(SerenityTransport::new(Arc::clone(&ctx.http)));
                Ok(BotData::new(handler, transport, settings))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::DIRECT_MESSAGE_REACTIONS;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}
