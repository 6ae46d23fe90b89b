use bytes::Bytes;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        command_utils::parse_integer,
        CommandError,
    },
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("PING", Arity::AtLeast(1), CommandKind::Connection, ping)
        .allowed_while_subscribed(),
    CommandSpec::new("ECHO", Arity::Exact(2), CommandKind::Connection, echo),
    CommandSpec::new("SELECT", Arity::Exact(2), CommandKind::Connection, select),
    CommandSpec::new("QUIT", Arity::Exact(1), CommandKind::Connection, quit)
        .allowed_while_subscribed(),
];

/// Handles the PING command.
///
/// Replies `+PONG`, or echoes the optional message as a bulk string. A
/// subscribed client gets the push-style `["pong", message]` array instead,
/// since its connection may interleave replies with published messages.
fn ping(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    if arguments.len() > 1 {
        return Err(CommandError::WrongNumberOfArguments("ping".to_string()));
    }

    let message = arguments.first().cloned();

    if context.client.is_subscribed() {
        return Ok(RespValue::Array(vec![
            RespValue::bulk_string("pong"),
            RespValue::BulkString(message.unwrap_or_default()),
        ])
        .into());
    }

    Ok(match message {
        Some(message) => RespValue::BulkString(message),
        None => RespValue::SimpleString("PONG".to_string()),
    }
    .into())
}

fn echo(_context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    Ok(RespValue::BulkString(arguments[0].clone()).into())
}

/// Handles the SELECT command, switching the database used by every later
/// command of this connection.
fn select(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let index = parse_integer(&arguments[0])?;

    let index = usize::try_from(index)
        .ok()
        .filter(|index| *index < context.state.store.database_count())
        .ok_or(CommandError::InvalidDatabaseIndex)?;

    context.client.db_index = index;
    Ok(RespValue::ok().into())
}

/// Handles the QUIT command. Any open transaction is dropped.
fn quit(context: &mut CommandContext<'_>, _arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    context.client.remove_transaction();
    Ok(CommandResult::Close(RespValue::ok()))
}
