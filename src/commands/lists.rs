use bytes::Bytes;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        command_utils::{normalize_index, normalize_range, parse_count, parse_integer},
        CommandError,
    },
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("LPUSH", Arity::AtLeast(3), CommandKind::Write, lpush),
    CommandSpec::new("RPUSH", Arity::AtLeast(3), CommandKind::Write, rpush),
    CommandSpec::new("LPOP", Arity::AtLeast(2), CommandKind::Write, lpop),
    CommandSpec::new("RPOP", Arity::AtLeast(2), CommandKind::Write, rpop),
    CommandSpec::new("LLEN", Arity::Exact(2), CommandKind::Read, llen),
    CommandSpec::new("LRANGE", Arity::Exact(4), CommandKind::Read, lrange),
    CommandSpec::new("LINDEX", Arity::Exact(3), CommandKind::Read, lindex),
    CommandSpec::new("LSET", Arity::Exact(4), CommandKind::Write, lset),
];

#[derive(Clone, Copy, PartialEq)]
enum End {
    Head,
    Tail,
}

/// Pushes every element in argument order, so `LPUSH k a b c` leaves the
/// list as `c b a`. Replies with the new length.
fn push(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
    end: End,
) -> Result<CommandResult, CommandError> {
    let list = context.database()?.list_entry(&arguments[0])?;

    for element in &arguments[1..] {
        match end {
            End::Head => list.push_front(element.clone()),
            End::Tail => list.push_back(element.clone()),
        }
    }

    Ok(RespValue::Integer(list.len() as i64).into())
}

fn lpush(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    push(context, arguments, End::Head)
}

fn rpush(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    push(context, arguments, End::Tail)
}

/// Represents the parsed arguments for LPOP and RPOP
struct PopArguments {
    key: Bytes,
    /// `None` pops a single element and replies with a bulk string.
    count: Option<usize>,
}

impl PopArguments {
    fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let count = match arguments {
            [_] => None,
            [_, count] => Some(parse_count(count)?),
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles LPOP and RPOP.
///
/// Without a count, replies with the popped element or nil. With a count,
/// replies with an array of up to `count` elements, or a nil array when the
/// key does not exist. A list emptied by the pop is deleted.
fn pop(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
    end: End,
) -> Result<CommandResult, CommandError> {
    let pop_arguments = PopArguments::parse(arguments)?;
    let database = context.database()?;

    let Some(list) = database.list_mut(&pop_arguments.key)? else {
        return Ok(match pop_arguments.count {
            Some(_) => RespValue::NullArray,
            None => RespValue::NullBulkString,
        }
        .into());
    };

    let amount = pop_arguments.count.unwrap_or(1).min(list.len());
    let popped: Vec<Bytes> = (0..amount)
        .filter_map(|_| match end {
            End::Head => list.pop_front(),
            End::Tail => list.pop_back(),
        })
        .collect();

    database.remove_if_empty(&pop_arguments.key);

    let reply = match pop_arguments.count {
        Some(_) => RespValue::bulk_string_array(popped),
        None => RespValue::optional_bulk_string(popped.into_iter().next()),
    };

    Ok(reply.into())
}

fn lpop(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    pop(context, arguments, End::Head)
}

fn rpop(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    pop(context, arguments, End::Tail)
}

fn llen(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let length = context
        .database()?
        .list(&arguments[0])?
        .map_or(0, |list| list.len());

    Ok(RespValue::Integer(length as i64).into())
}

/// Handles the LRANGE command.
///
/// Both indexes are inclusive and may be negative to count from the tail.
/// Out of range indexes are clamped; an empty selection replies an empty
/// array.
fn lrange(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let start = parse_integer(&arguments[1])?;
    let stop = parse_integer(&arguments[2])?;

    let Some(list) = context.database()?.list(&arguments[0])? else {
        return Ok(RespValue::Array(Vec::new()).into());
    };

    let elements: Vec<Bytes> = match normalize_range(list.len(), start, stop) {
        Some((start, stop)) => list.range(start..=stop).cloned().collect(),
        None => Vec::new(),
    };

    Ok(RespValue::bulk_string_array(elements).into())
}

fn lindex(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let index = parse_integer(&arguments[1])?;

    let element = context
        .database()?
        .list(&arguments[0])?
        .and_then(|list| normalize_index(list.len(), index).and_then(|index| list.get(index)))
        .cloned();

    Ok(RespValue::optional_bulk_string(element).into())
}

fn lset(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let index = parse_integer(&arguments[1])?;

    let list = context
        .database()?
        .list_mut(&arguments[0])?
        .ok_or(CommandError::NoSuchKey)?;

    let index = normalize_index(list.len(), index).ok_or(CommandError::IndexOutOfRange)?;
    list[index] = arguments[2].clone();

    Ok(RespValue::ok().into())
}
