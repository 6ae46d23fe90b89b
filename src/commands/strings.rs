use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::time::Instant;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        command_utils::{format_integer, is_keyword, parse_integer},
        CommandError,
    },
    key_value_store::{DataType, Value},
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("GET", Arity::Exact(2), CommandKind::Read, get),
    CommandSpec::new("SET", Arity::AtLeast(3), CommandKind::Write, set),
    CommandSpec::new("SETNX", Arity::Exact(3), CommandKind::Write, setnx),
    CommandSpec::new("GETSET", Arity::Exact(3), CommandKind::Write, getset),
    CommandSpec::new("MGET", Arity::AtLeast(2), CommandKind::Read, mget),
    CommandSpec::new("MSET", Arity::AtLeast(3), CommandKind::Write, mset),
    CommandSpec::new("APPEND", Arity::Exact(3), CommandKind::Write, append),
    CommandSpec::new("STRLEN", Arity::Exact(2), CommandKind::Read, strlen),
    CommandSpec::new("INCR", Arity::Exact(2), CommandKind::Write, incr),
    CommandSpec::new("DECR", Arity::Exact(2), CommandKind::Write, decr),
    CommandSpec::new("INCRBY", Arity::Exact(3), CommandKind::Write, incrby),
    CommandSpec::new("DECRBY", Arity::Exact(3), CommandKind::Write, decrby),
];

fn get(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let data = context.database()?.string(&arguments[0])?.cloned();
    Ok(RespValue::optional_bulk_string(data).into())
}

/// How SET treats the deadline of the key.
#[derive(Debug, PartialEq)]
enum SetExpiration {
    /// Drop any existing deadline.
    Clear,
    /// KEEPTTL
    Keep,
    At(Instant),
}

#[derive(Debug, PartialEq)]
enum SetCondition {
    IfAbsent,
    IfPresent,
}

/// Represents the parsed arguments for SET command
#[derive(Debug)]
struct SetArguments {
    key: Bytes,
    value: Bytes,
    expiration: SetExpiration,
    condition: Option<SetCondition>,
    /// Reply with the previous value instead of OK.
    get: bool,
}

impl SetArguments {
    /// Parses `key value [EX seconds | PX milliseconds | KEEPTTL] [NX | XX] [GET]`.
    ///
    /// Options may come in any order. Conflicting or repeated options are a
    /// syntax error, and a non-positive timeout is rejected.
    fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let mut expiration = SetExpiration::Clear;
        let mut condition = None;
        let mut get = false;

        let mut options = arguments[2..].iter();

        while let Some(option) = options.next() {
            if is_keyword(option, "EX") || is_keyword(option, "PX") {
                if expiration != SetExpiration::Clear {
                    return Err(CommandError::SyntaxError);
                }

                let amount = options.next().ok_or(CommandError::SyntaxError)?;
                let amount = parse_integer(amount)?;
                if amount <= 0 {
                    return Err(CommandError::InvalidExpireTime("set".to_string()));
                }

                let timeout = if is_keyword(option, "EX") {
                    Duration::from_secs(amount as u64)
                } else {
                    Duration::from_millis(amount as u64)
                };

                let deadline = Instant::now()
                    .checked_add(timeout)
                    .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))?;
                expiration = SetExpiration::At(deadline);
            } else if is_keyword(option, "KEEPTTL") {
                if expiration != SetExpiration::Clear {
                    return Err(CommandError::SyntaxError);
                }
                expiration = SetExpiration::Keep;
            } else if is_keyword(option, "NX") || is_keyword(option, "XX") {
                if condition.is_some() {
                    return Err(CommandError::SyntaxError);
                }
                condition = Some(if is_keyword(option, "NX") {
                    SetCondition::IfAbsent
                } else {
                    SetCondition::IfPresent
                });
            } else if is_keyword(option, "GET") && !get {
                get = true;
            } else {
                return Err(CommandError::SyntaxError);
            }
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            expiration,
            condition,
            get,
        })
    }
}

/// Handles the SET command.
///
/// Stores a string under the key, replacing a value of any type. With NX or
/// XX the write only happens when the key is absent or present respectively;
/// a skipped write replies nil. With GET the reply is the previous string
/// value, and a previous non-string value fails the whole command.
fn set(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;
    let database = context.database()?;

    let previous = if set_arguments.get {
        database.string(&set_arguments.key)?.cloned()
    } else {
        None
    };

    let exists = database.contains(&set_arguments.key);
    let skip = match set_arguments.condition {
        Some(SetCondition::IfAbsent) => exists,
        Some(SetCondition::IfPresent) => !exists,
        None => false,
    };

    if !skip {
        let expiration = match set_arguments.expiration {
            SetExpiration::Clear => None,
            SetExpiration::Keep => database
                .get(&set_arguments.key)
                .and_then(|value| value.expiration),
            SetExpiration::At(deadline) => Some(deadline),
        };

        database.insert_value(
            set_arguments.key,
            Value {
                data: DataType::String(set_arguments.value),
                expiration,
            },
        );
    }

    if set_arguments.get {
        Ok(RespValue::optional_bulk_string(previous).into())
    } else if skip {
        Ok(RespValue::NullBulkString.into())
    } else {
        Ok(RespValue::ok().into())
    }
}

fn setnx(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    if database.contains(&arguments[0]) {
        return Ok(RespValue::Integer(0).into());
    }

    database.insert(arguments[0].clone(), DataType::String(arguments[1].clone()));
    Ok(RespValue::Integer(1).into())
}

fn getset(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;
    let previous = database.string(&arguments[0])?.cloned();

    database.insert(arguments[0].clone(), DataType::String(arguments[1].clone()));
    Ok(RespValue::optional_bulk_string(previous).into())
}

/// Values of several keys. Missing keys and keys holding another type are
/// reported as nil.
fn mget(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    let values = arguments
        .iter()
        .map(|key| match database.string(key) {
            Ok(Some(data)) => RespValue::BulkString(data.clone()),
            _ => RespValue::NullBulkString,
        })
        .collect();

    Ok(RespValue::Array(values).into())
}

fn mset(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    if arguments.len() % 2 != 0 {
        return Err(CommandError::WrongNumberOfArguments("mset".to_string()));
    }

    let database = context.database()?;
    for pair in arguments.chunks_exact(2) {
        database.insert(pair[0].clone(), DataType::String(pair[1].clone()));
    }

    Ok(RespValue::ok().into())
}

/// Appends to the string at key, creating it when missing. Replies with the
/// new length. The deadline of the key is kept.
fn append(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    let length = match database.string_mut(&arguments[0])? {
        Some(data) => {
            let mut joined = BytesMut::with_capacity(data.len() + arguments[1].len());
            joined.extend_from_slice(data);
            joined.extend_from_slice(&arguments[1]);
            *data = joined.freeze();
            data.len()
        }
        None => {
            database.insert(arguments[0].clone(), DataType::String(arguments[1].clone()));
            arguments[1].len()
        }
    };

    Ok(RespValue::Integer(length as i64).into())
}

fn strlen(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let length = context
        .database()?
        .string(&arguments[0])?
        .map_or(0, Bytes::len);

    Ok(RespValue::Integer(length as i64).into())
}

/// Adds `delta` to the integer stored at key, treating a missing key as 0.
fn increment(
    context: &mut CommandContext<'_>,
    key: &Bytes,
    delta: i64,
) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    let current = match database.string(key)? {
        Some(data) => parse_integer(data)?,
        None => 0,
    };
    let next = current
        .checked_add(delta)
        .ok_or(CommandError::IncrementOverflow)?;

    match database.string_mut(key)? {
        Some(data) => *data = format_integer(next),
        None => {
            database.insert(key.clone(), DataType::String(format_integer(next)));
        }
    }

    Ok(RespValue::Integer(next).into())
}

fn incr(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    increment(context, &arguments[0], 1)
}

fn decr(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    increment(context, &arguments[0], -1)
}

fn incrby(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let delta = parse_integer(&arguments[1])?;
    increment(context, &arguments[0], delta)
}

fn decrby(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let delta = parse_integer(&arguments[1])?
        .checked_neg()
        .ok_or(CommandError::IncrementOverflow)?;
    increment(context, &arguments[0], delta)
}
