use bytes::Bytes;

use crate::{
    commands::{
        command_handler::{CommandContext, CommandResult},
        CommandError,
    },
    resp::RespValue,
};

/// Handles the DISCARD command, dropping every queued command.
pub fn discard(
    context: &mut CommandContext<'_>,
    _arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    context
        .client
        .remove_transaction()
        .ok_or(CommandError::DiscardWithoutMulti)?;

    Ok(RespValue::ok().into())
}
