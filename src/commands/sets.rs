use std::collections::HashSet;

use bytes::Bytes;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        CommandError,
    },
    key_value_store::Database,
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("SADD", Arity::AtLeast(3), CommandKind::Write, sadd),
    CommandSpec::new("SREM", Arity::AtLeast(3), CommandKind::Write, srem),
    CommandSpec::new("SISMEMBER", Arity::Exact(3), CommandKind::Read, sismember),
    CommandSpec::new("SMEMBERS", Arity::Exact(2), CommandKind::Read, smembers),
    CommandSpec::new("SCARD", Arity::Exact(2), CommandKind::Read, scard),
    CommandSpec::new("SUNION", Arity::AtLeast(2), CommandKind::Read, sunion),
    CommandSpec::new("SINTER", Arity::AtLeast(2), CommandKind::Read, sinter),
    CommandSpec::new("SDIFF", Arity::AtLeast(2), CommandKind::Read, sdiff),
];

fn sadd(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let set = context.database()?.set_entry(&arguments[0])?;
    let added = arguments[1..]
        .iter()
        .filter(|member| set.insert((*member).clone()))
        .count();

    Ok(RespValue::Integer(added as i64).into())
}

fn srem(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    let Some(set) = database.set_mut(&arguments[0])? else {
        return Ok(RespValue::Integer(0).into());
    };

    let removed = arguments[1..]
        .iter()
        .filter(|member| set.remove(*member))
        .count();

    database.remove_if_empty(&arguments[0]);
    Ok(RespValue::Integer(removed as i64).into())
}

fn sismember(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let member = context
        .database()?
        .set(&arguments[0])?
        .is_some_and(|set| set.contains(&arguments[1]));

    Ok(RespValue::Integer(member as i64).into())
}

fn smembers(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let members = load_set(context.database()?, &arguments[0])?;
    Ok(RespValue::bulk_string_array(members).into())
}

fn scard(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let length = context
        .database()?
        .set(&arguments[0])?
        .map_or(0, |set| set.len());

    Ok(RespValue::Integer(length as i64).into())
}

/// A copy of the set at `key`; a missing key is the empty set.
fn load_set(database: &mut Database, key: &[u8]) -> Result<HashSet<Bytes>, CommandError> {
    Ok(database.set(key)?.cloned().unwrap_or_default())
}

/// Loads every named set first so that a wrong-typed key fails the command
/// before any result is computed.
fn load_sets(context: &mut CommandContext<'_>, keys: &[Bytes]) -> Result<Vec<HashSet<Bytes>>, CommandError> {
    let database = context.database()?;
    keys.iter().map(|key| load_set(database, key)).collect()
}

fn sunion(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let union: HashSet<Bytes> = load_sets(context, arguments)?.into_iter().flatten().collect();
    Ok(RespValue::bulk_string_array(union).into())
}

fn sinter(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let mut sets = load_sets(context, arguments)?.into_iter();
    let first = sets.next().unwrap_or_default();

    let intersection = sets.fold(first, |accumulated, set| {
        accumulated.into_iter().filter(|member| set.contains(member)).collect()
    });

    Ok(RespValue::bulk_string_array(intersection).into())
}

/// Members of the first set that are in none of the others.
fn sdiff(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let mut sets = load_sets(context, arguments)?.into_iter();
    let first = sets.next().unwrap_or_default();

    let difference = sets.fold(first, |accumulated, set| {
        accumulated.into_iter().filter(|member| !set.contains(member)).collect()
    });

    Ok(RespValue::bulk_string_array(difference).into())
}
