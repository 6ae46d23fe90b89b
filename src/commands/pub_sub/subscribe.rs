use bytes::Bytes;

use crate::{
    commands::{
        command_handler::{CommandContext, CommandResult},
        CommandError,
    },
    resp::RespValue,
};

/// `[kind, name, count]`, where count is the number of channels and patterns
/// the client is still subscribed to.
fn confirmation(kind: &'static str, name: Option<Bytes>, count: usize) -> RespValue {
    RespValue::Array(vec![
        RespValue::bulk_string(kind),
        RespValue::optional_bulk_string(name),
        RespValue::Integer(count as i64),
    ])
}

/// Handles the SUBSCRIBE command.
///
/// Registers the client on every named channel and replies with one
/// confirmation per channel. Subscribing twice to a channel is harmless.
/// From the first subscription on the connection is in subscribed mode.
pub fn subscribe(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let mut replies = Vec::with_capacity(arguments.len());

    for channel in arguments {
        if context.client.add_channel(channel.clone()) {
            context.state.pub_sub.subscribe(
                channel.clone(),
                context.client.id,
                context.client.push_sender(),
            );
        }

        replies.push(confirmation(
            "subscribe",
            Some(channel.clone()),
            context.client.subscription_count(),
        ));
    }

    Ok(CommandResult::Replies(replies))
}

/// Handles the UNSUBSCRIBE command. Without arguments the client leaves
/// every channel it joined.
pub fn unsubscribe(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let channels = if arguments.is_empty() {
        context.client.channels()
    } else {
        arguments.to_vec()
    };

    if channels.is_empty() {
        return Ok(CommandResult::Replies(vec![confirmation(
            "unsubscribe",
            None,
            context.client.subscription_count(),
        )]));
    }

    let mut replies = Vec::with_capacity(channels.len());

    for channel in channels {
        if context.client.remove_channel(&channel) {
            context.state.pub_sub.unsubscribe(&channel, context.client.id);
        }

        replies.push(confirmation(
            "unsubscribe",
            Some(channel),
            context.client.subscription_count(),
        ));
    }

    Ok(CommandResult::Replies(replies))
}

pub fn psubscribe(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let mut replies = Vec::with_capacity(arguments.len());

    for pattern in arguments {
        if context.client.add_pattern(pattern.clone()) {
            context.state.pub_sub.psubscribe(
                pattern.clone(),
                context.client.id,
                context.client.push_sender(),
            );
        }

        replies.push(confirmation(
            "psubscribe",
            Some(pattern.clone()),
            context.client.subscription_count(),
        ));
    }

    Ok(CommandResult::Replies(replies))
}

pub fn punsubscribe(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let patterns = if arguments.is_empty() {
        context.client.patterns()
    } else {
        arguments.to_vec()
    };

    if patterns.is_empty() {
        return Ok(CommandResult::Replies(vec![confirmation(
            "punsubscribe",
            None,
            context.client.subscription_count(),
        )]));
    }

    let mut replies = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        if context.client.remove_pattern(&pattern) {
            context.state.pub_sub.punsubscribe(&pattern, context.client.id);
        }

        replies.push(confirmation(
            "punsubscribe",
            Some(pattern),
            context.client.subscription_count(),
        ));
    }

    Ok(CommandResult::Replies(replies))
}
