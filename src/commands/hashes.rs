use bytes::Bytes;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        command_utils::{format_integer, parse_integer},
        CommandError,
    },
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("HSET", Arity::AtLeast(4), CommandKind::Write, hset),
    CommandSpec::new("HMSET", Arity::AtLeast(4), CommandKind::Write, hmset),
    CommandSpec::new("HSETNX", Arity::Exact(4), CommandKind::Write, hsetnx),
    CommandSpec::new("HGET", Arity::Exact(3), CommandKind::Read, hget),
    CommandSpec::new("HMGET", Arity::AtLeast(3), CommandKind::Read, hmget),
    CommandSpec::new("HDEL", Arity::AtLeast(3), CommandKind::Write, hdel),
    CommandSpec::new("HEXISTS", Arity::Exact(3), CommandKind::Read, hexists),
    CommandSpec::new("HGETALL", Arity::Exact(2), CommandKind::Read, hgetall),
    CommandSpec::new("HKEYS", Arity::Exact(2), CommandKind::Read, hkeys),
    CommandSpec::new("HVALS", Arity::Exact(2), CommandKind::Read, hvals),
    CommandSpec::new("HLEN", Arity::Exact(2), CommandKind::Read, hlen),
    CommandSpec::new("HINCRBY", Arity::Exact(4), CommandKind::Write, hincrby),
];

/// Handles the HSET command.
///
/// Sets one or more field/value pairs, creating the hash when needed.
/// Replies with the number of fields that did not exist before.
fn hset(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let added = set_fields(context, arguments, "hset")?;
    Ok(RespValue::Integer(added as i64).into())
}

/// Handles the HMSET command: HSET with a plain OK reply.
fn hmset(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    set_fields(context, arguments, "hmset")?;
    Ok(RespValue::ok().into())
}

/// Stores every field/value pair after the key. Returns how many fields
/// were new. An odd number of words is an arity error for `command`.
fn set_fields(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
    command: &str,
) -> Result<usize, CommandError> {
    let pairs = &arguments[1..];
    if pairs.len() % 2 != 0 {
        return Err(CommandError::WrongNumberOfArguments(command.to_string()));
    }

    let hash = context.database()?.hash_entry(&arguments[0])?;
    let added = pairs
        .chunks_exact(2)
        .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
        .count();

    Ok(added)
}

fn hsetnx(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let hash = context.database()?.hash_entry(&arguments[0])?;

    if hash.contains_key(&arguments[1]) {
        return Ok(RespValue::Integer(0).into());
    }

    hash.insert(arguments[1].clone(), arguments[2].clone());
    Ok(RespValue::Integer(1).into())
}

fn hget(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let value = context
        .database()?
        .hash(&arguments[0])?
        .and_then(|hash| hash.get(&arguments[1]))
        .cloned();

    Ok(RespValue::optional_bulk_string(value).into())
}

fn hmget(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let hash = context.database()?.hash(&arguments[0])?;

    let values = arguments[1..]
        .iter()
        .map(|field| RespValue::optional_bulk_string(hash.and_then(|hash| hash.get(field)).cloned()))
        .collect();

    Ok(RespValue::Array(values).into())
}

/// Removes fields and replies with how many existed. A hash left without
/// fields is deleted.
fn hdel(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    let Some(hash) = database.hash_mut(&arguments[0])? else {
        return Ok(RespValue::Integer(0).into());
    };

    let removed = arguments[1..]
        .iter()
        .filter(|field| hash.remove(*field).is_some())
        .count();

    database.remove_if_empty(&arguments[0]);
    Ok(RespValue::Integer(removed as i64).into())
}

fn hexists(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let exists = context
        .database()?
        .hash(&arguments[0])?
        .is_some_and(|hash| hash.contains_key(&arguments[1]));

    Ok(RespValue::Integer(exists as i64).into())
}

/// Fields and values interleaved, in no particular order.
fn hgetall(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let entries: Vec<Bytes> = context
        .database()?
        .hash(&arguments[0])?
        .map(|hash| {
            hash.iter()
                .flat_map(|(field, value)| [field.clone(), value.clone()])
                .collect()
        })
        .unwrap_or_default();

    Ok(RespValue::bulk_string_array(entries).into())
}

fn hkeys(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let fields: Vec<Bytes> = context
        .database()?
        .hash(&arguments[0])?
        .map(|hash| hash.keys().cloned().collect())
        .unwrap_or_default();

    Ok(RespValue::bulk_string_array(fields).into())
}

fn hvals(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let values: Vec<Bytes> = context
        .database()?
        .hash(&arguments[0])?
        .map(|hash| hash.values().cloned().collect())
        .unwrap_or_default();

    Ok(RespValue::bulk_string_array(values).into())
}

fn hlen(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let length = context
        .database()?
        .hash(&arguments[0])?
        .map_or(0, |hash| hash.len());

    Ok(RespValue::Integer(length as i64).into())
}

fn hincrby(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let delta = parse_integer(&arguments[2])?;
    let hash = context.database()?.hash_entry(&arguments[0])?;

    let current = match hash.get(&arguments[1]) {
        Some(value) => parse_integer(value).map_err(|_| CommandError::HashValueNotAnInteger)?,
        None => 0,
    };
    let next = current
        .checked_add(delta)
        .ok_or(CommandError::IncrementOverflow)?;

    hash.insert(arguments[1].clone(), format_integer(next));
    Ok(RespValue::Integer(next).into())
}
