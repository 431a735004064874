//! Gateway event routing.
//!
//! Turns serenity reaction and rate-limit events into the plain values the
//! interactive handler understands, and hands them over.

use crate::{
    bot::BotData,
    errors::{Error, Result},
    interactive::{Actor, HttpMethod, MessageId, RateLimitInfo, ReactionEvent},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, trace};

/// poise `event_handler` entry point.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            if let Some(reaction) = reaction_event(ctx, add_reaction).await {
                let dispatch = data.handler.handle_reaction(&reaction).await;
                trace!("Reaction add on {}: {:?}", reaction.message_id, dispatch);
            }
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            if let Some(reaction) = reaction_event(ctx, removed_reaction).await {
                let dispatch = data.handler.handle_reaction_removed(&reaction).await;
                trace!("Reaction remove on {}: {:?}", reaction.message_id, dispatch);
            }
        }
        serenity::FullEvent::Ratelimit { data: info } => {
            data.handler.handle_rate_limit(&rate_limit_info(info)).await;
        }
        _ => {}
    }
    Ok(())
}

/// Only unicode emojis are used as buttons; custom emojis are matched by name.
fn emoji_key(emoji: &serenity::ReactionType) -> Option<String> {
    match emoji {
        serenity::ReactionType::Unicode(text) => Some(text.clone()),
        serenity::ReactionType::Custom { name, .. } => name.clone(),
        _ => None,
    }
}

fn actor_from_user(user: &serenity::User) -> Actor {
    Actor {
        id: user.id.get(),
        name: user.name.clone(),
        bot: user.bot,
        partial: false,
    }
}

async fn reaction_actor(ctx: &serenity::Context, reaction: &serenity::Reaction) -> Actor {
    if let Some(member) = &reaction.member {
        return actor_from_user(&member.user);
    }
    let Some(user_id) = reaction.user_id else {
        return Actor::partial(0);
    };
    match reaction.user(ctx).await {
        Ok(user) => actor_from_user(&user),
        Err(e) => {
            debug!("Could not resolve reacting user {}: {}", user_id, e);
            Actor::partial(user_id.get())
        }
    }
}

async fn reaction_event(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
) -> Option<ReactionEvent> {
    let emoji = emoji_key(&reaction.emoji)?;
    Some(ReactionEvent {
        message_id: MessageId(reaction.message_id.get()),
        emoji,
        actor: reaction_actor(ctx, reaction).await,
    })
}

fn http_method(method: serenity::LightMethod) -> HttpMethod {
    match method {
        serenity::LightMethod::Patch => HttpMethod::Patch,
        serenity::LightMethod::Post => HttpMethod::Post,
        serenity::LightMethod::Put => HttpMethod::Put,
        serenity::LightMethod::Delete => HttpMethod::Delete,
        _ => HttpMethod::Get,
    }
}

fn rate_limit_info(info: &serenity::RatelimitInfo) -> RateLimitInfo {
    RateLimitInfo {
        method: http_method(info.method),
        path: info.path.clone(),
        timeout: info.timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unicode_emoji_key() {
        let emoji = serenity::ReactionType::Unicode("➡️".to_string());
        assert_eq!(emoji_key(&emoji).as_deref(), Some("➡️"));
    }

    #[test]
    fn test_patch_maps_to_patch() {
        assert_eq!(http_method(serenity::LightMethod::Patch), HttpMethod::Patch);
        assert_eq!(http_method(serenity::LightMethod::Get), HttpMethod::Get);
        assert_eq!(http_method(serenity::LightMethod::Post), HttpMethod::Post);
        assert_eq!(http_method(serenity::LightMethod::Put), HttpMethod::Put);
        assert_eq!(http_method(serenity::LightMethod::Delete), HttpMethod::Delete);
    }
}
