use bytes::Bytes;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        command_utils::{is_keyword, parse_integer},
        CommandError,
    },
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("DEL", Arity::AtLeast(2), CommandKind::Write, del),
    CommandSpec::new("EXISTS", Arity::AtLeast(2), CommandKind::Read, exists),
    CommandSpec::new("KEYS", Arity::Exact(2), CommandKind::Read, keys),
    CommandSpec::new("RENAME", Arity::Exact(3), CommandKind::Write, rename),
    CommandSpec::new("RENAMENX", Arity::Exact(3), CommandKind::Write, renamenx),
    CommandSpec::new("TYPE", Arity::Exact(2), CommandKind::Read, type_command),
    CommandSpec::new("DBSIZE", Arity::Exact(1), CommandKind::Read, dbsize),
    CommandSpec::new("FLUSHDB", Arity::AtLeast(1), CommandKind::Write, flushdb),
    CommandSpec::new("FLUSHALL", Arity::AtLeast(1), CommandKind::Write, flushall),
    CommandSpec::new("RANDOMKEY", Arity::Exact(1), CommandKind::Read, randomkey),
    CommandSpec::new("MOVE", Arity::Exact(3), CommandKind::Write, move_command),
];

fn del(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;
    let removed = arguments
        .iter()
        .filter(|key| database.remove(key).is_some())
        .count();

    Ok(RespValue::Integer(removed as i64).into())
}

/// Counts existing keys. A key named twice is counted twice.
fn exists(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;
    let found = arguments.iter().filter(|key| database.contains(key)).count();

    Ok(RespValue::Integer(found as i64).into())
}

/// Handles the KEYS command.
///
/// Returns every live key of the selected database matching the glob
/// pattern. The order of the returned keys is unspecified.
fn keys(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let keys = context.database()?.keys(&arguments[0]);

    Ok(RespValue::bulk_string_array(keys).into())
}

fn rename(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    if !database.rename(&arguments[0], arguments[1].clone()) {
        return Err(CommandError::NoSuchKey);
    }

    Ok(RespValue::ok().into())
}

/// Like RENAME, but only when the new name is free. Replies 1 or 0.
fn renamenx(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    if !database.contains(&arguments[0]) {
        return Err(CommandError::NoSuchKey);
    }

    if database.contains(&arguments[1]) {
        return Ok(RespValue::Integer(0).into());
    }

    database.rename(&arguments[0], arguments[1].clone());
    Ok(RespValue::Integer(1).into())
}

fn type_command(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let type_name = context
        .database()?
        .get(&arguments[0])
        .map_or("none", |value| value.data.type_name());

    Ok(RespValue::SimpleString(type_name.to_string()).into())
}

fn dbsize(context: &mut CommandContext<'_>, _arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let size = context.database()?.len();
    Ok(RespValue::Integer(size as i64).into())
}

/// Accepts the optional ASYNC/SYNC modifier of the flush commands. Both
/// flush immediately.
fn check_flush_mode(arguments: &[Bytes]) -> Result<(), CommandError> {
    match arguments {
        [] => Ok(()),
        [mode] if is_keyword(mode, "ASYNC") || is_keyword(mode, "SYNC") => Ok(()),
        _ => Err(CommandError::SyntaxError),
    }
}

fn flushdb(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    check_flush_mode(arguments)?;
    context.database()?.clear();

    Ok(RespValue::ok().into())
}

fn flushall(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    check_flush_mode(arguments)?;
    context.state.store.flush_all();

    Ok(RespValue::ok().into())
}

fn randomkey(context: &mut CommandContext<'_>, _arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let key = context.database()?.random_key();
    Ok(RespValue::optional_bulk_string(key).into())
}

/// Handles the MOVE command, transferring a key (and its deadline) to
/// another database. Replies 0 when the key is missing here or already
/// present in the target.
fn move_command(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let target = parse_integer(&arguments[1])?;
    let target = usize::try_from(target)
        .ok()
        .filter(|target| *target < context.state.store.database_count())
        .ok_or(CommandError::InvalidDatabaseIndex)?;

    let source = context.client.db_index;
    if source == target {
        return Err(CommandError::SameObject);
    }

    let moved = context.state.store.move_key(source, target, &arguments[0]);
    Ok(RespValue::Integer(moved as i64).into())
}
