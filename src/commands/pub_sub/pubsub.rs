use bytes::Bytes;

use crate::{
    commands::{
        command_handler::{CommandContext, CommandResult},
        command_utils::is_keyword,
        CommandError,
    },
    resp::RespValue,
};

/// Handles `PUBSUB CHANNELS [pattern]`, `PUBSUB NUMSUB [channel ...]` and
/// `PUBSUB NUMPAT`.
pub fn pubsub(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let subcommand = &arguments[0];
    let rest = &arguments[1..];
    let pub_sub = &context.state.pub_sub;

    let reply = if is_keyword(subcommand, "CHANNELS") {
        let pattern = match rest {
            [] => None,
            [pattern] => Some(&pattern[..]),
            _ => {
                return Err(CommandError::WrongNumberOfArguments(
                    "pubsub|channels".to_string(),
                ))
            }
        };

        RespValue::bulk_string_array(pub_sub.channels(pattern))
    } else if is_keyword(subcommand, "NUMSUB") {
        let mut counts = Vec::with_capacity(rest.len() * 2);
        for channel in rest {
            counts.push(RespValue::BulkString(channel.clone()));
            counts.push(RespValue::Integer(pub_sub.subscriber_count(channel) as i64));
        }

        RespValue::Array(counts)
    } else if is_keyword(subcommand, "NUMPAT") {
        if !rest.is_empty() {
            return Err(CommandError::WrongNumberOfArguments(
                "pubsub|numpat".to_string(),
            ));
        }

        RespValue::Integer(pub_sub.pattern_count() as i64)
    } else {
        return Err(CommandError::UnknownSubcommand(
            String::from_utf8_lossy(subcommand).into_owned(),
            "PUBSUB".to_string(),
        ));
    };

    Ok(reply.into())
}
