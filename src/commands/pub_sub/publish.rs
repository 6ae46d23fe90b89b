use bytes::Bytes;

use crate::{
    commands::{
        command_handler::{CommandContext, CommandResult},
        CommandError,
    },
    resp::RespValue,
};

/// Handles the PUBLISH command.
///
/// Queues the message for every client subscribed to the channel, directly
/// or through a matching pattern, and replies with the number of deliveries.
/// A client matching through several patterns receives one message per
/// pattern.
pub fn publish(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let receivers = context.state.pub_sub.publish(&arguments[0], &arguments[1]);
    Ok(RespValue::Integer(receivers as i64).into())
}
