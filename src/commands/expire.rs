use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::time::Instant;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        command_utils::parse_integer,
        CommandError,
    },
    key_value_store::TimeToLive,
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("EXPIRE", Arity::Exact(3), CommandKind::Write, expire),
    CommandSpec::new("PEXPIRE", Arity::Exact(3), CommandKind::Write, pexpire),
    CommandSpec::new("EXPIREAT", Arity::Exact(3), CommandKind::Write, expireat),
    CommandSpec::new("PEXPIREAT", Arity::Exact(3), CommandKind::Write, pexpireat),
    CommandSpec::new("TTL", Arity::Exact(2), CommandKind::Read, ttl),
    CommandSpec::new("PTTL", Arity::Exact(2), CommandKind::Read, pttl),
    CommandSpec::new("PERSIST", Arity::Exact(2), CommandKind::Write, persist),
];

#[derive(Clone, Copy)]
enum TimeUnit {
    Seconds,
    Milliseconds,
}

/// Parsed arguments shared by the EXPIRE family.
struct ExpireArguments {
    key: Bytes,
    deadline: Instant,
}

impl ExpireArguments {
    /// Turns `[key, time]` into an absolute deadline. `absolute` selects the
    /// `*AT` variants, whose time is a unix timestamp instead of a delay.
    fn parse(
        command: &str,
        arguments: &[Bytes],
        unit: TimeUnit,
        absolute: bool,
    ) -> Result<Self, CommandError> {
        let invalid = || CommandError::InvalidExpireTime(command.to_string());

        let amount = parse_integer(&arguments[1])?;
        let mut milliseconds = match unit {
            TimeUnit::Seconds => amount.checked_mul(1000).ok_or_else(invalid)?,
            TimeUnit::Milliseconds => amount,
        };

        if absolute {
            milliseconds = milliseconds
                .checked_sub(unix_time_in_milliseconds())
                .ok_or_else(invalid)?;
        }

        let now = Instant::now();
        let deadline = if milliseconds <= 0 {
            now
        } else {
            now.checked_add(Duration::from_millis(milliseconds as u64))
                .ok_or_else(invalid)?
        };

        Ok(Self {
            key: arguments[0].clone(),
            deadline,
        })
    }
}

fn unix_time_in_milliseconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

fn set_deadline(
    context: &mut CommandContext<'_>,
    expire_arguments: ExpireArguments,
) -> Result<CommandResult, CommandError> {
    let updated = context
        .database()?
        .set_expiration(&expire_arguments.key, Some(expire_arguments.deadline));

    Ok(RespValue::Integer(updated as i64).into())
}

/// Handles the EXPIRE command.
///
/// Sets a timeout of `seconds` on an existing key. A non-positive timeout
/// deletes the key right away. Replies 1 when the key exists, 0 otherwise.
fn expire(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let expire_arguments = ExpireArguments::parse("expire", arguments, TimeUnit::Seconds, false)?;
    set_deadline(context, expire_arguments)
}

fn pexpire(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let expire_arguments =
        ExpireArguments::parse("pexpire", arguments, TimeUnit::Milliseconds, false)?;
    set_deadline(context, expire_arguments)
}

fn expireat(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let expire_arguments = ExpireArguments::parse("expireat", arguments, TimeUnit::Seconds, true)?;
    set_deadline(context, expire_arguments)
}

fn pexpireat(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let expire_arguments =
        ExpireArguments::parse("pexpireat", arguments, TimeUnit::Milliseconds, true)?;
    set_deadline(context, expire_arguments)
}

fn remaining(
    context: &mut CommandContext<'_>,
    key: &[u8],
    unit: TimeUnit,
) -> Result<CommandResult, CommandError> {
    let reply = match context.database()?.ttl(key) {
        None => -2,
        Some(TimeToLive::Persistent) => -1,
        Some(TimeToLive::Expires(left)) => {
            let milliseconds = left.as_millis() as i64;
            match unit {
                TimeUnit::Seconds => (milliseconds + 500) / 1000,
                TimeUnit::Milliseconds => milliseconds,
            }
        }
    };

    Ok(RespValue::Integer(reply).into())
}

/// Remaining time to live in seconds, rounded to the nearest second. -2 for
/// a missing key, -1 for a key without deadline.
fn ttl(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    remaining(context, &arguments[0], TimeUnit::Seconds)
}

fn pttl(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    remaining(context, &arguments[0], TimeUnit::Milliseconds)
}

fn persist(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    let had_deadline = matches!(database.ttl(&arguments[0]), Some(TimeToLive::Expires(_)));
    if had_deadline {
        database.set_expiration(&arguments[0], None);
    }

    Ok(RespValue::Integer(had_deadline as i64).into())
}
