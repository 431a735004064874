//! General Discord commands - ping and an interactive help.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
        interactive::ChannelId,
        messages::PagedMessage,
    };

    /// Commands listed per help page.
    const COMMANDS_PER_PAGE: usize = 5;

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Shows every command in a paged message.
    ///
    /// Flip pages with ⬅️ and ➡️; the message goes inert after a while without presses.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let lines: Vec<String> = ctx
            .framework()
            .options()
            .commands
            .iter()
            .map(|command| {
                format!(
                    "`{}{}` - {}",
                    ctx.data().settings.bot.prefix,
                    command.name,
                    command.description.as_deref().unwrap_or("No description")
                )
            })
            .collect();

        let data = ctx.data();
        let options = data
            .message_options()
            .lifetime(data.settings.interactive.page_lifetime());
        let paged = PagedMessage::from_items(
            ChannelId(ctx.channel_id().get()),
            std::sync::Arc::clone(&data.transport),
            &data.handler,
            "The Beastiary - Commands",
            &lines,
            COMMANDS_PER_PAGE,
            options,
        )?;

        if let poise::Context::Application(_) = ctx {
            ctx.send(
                poise::CreateReply::default()
                    .content("📖 Help is on its way.")
                    .ephemeral(true),
            )
            .await?;
        }
        paged.send().await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
