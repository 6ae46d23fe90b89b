use bytes::Bytes;

use crate::{
    commands::{
        command_handler::{CommandContext, CommandResult},
        CommandError,
    },
    resp::RespValue,
};

/// Handles the MULTI command.
///
/// Switches the connection into queuing mode: until EXEC or DISCARD, the
/// dispatcher validates and queues every command instead of running it.
pub fn multi(
    context: &mut CommandContext<'_>,
    _arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    if !context.client.start_transaction() {
        return Err(CommandError::NestedMulti);
    }

    Ok(RespValue::ok().into())
}
