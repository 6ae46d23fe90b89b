use bytes::Bytes;

use crate::{
    commands::{
        command_dispatcher::{Arity, CommandKind, CommandSpec},
        command_handler::{CommandContext, CommandResult},
        command_utils::{format_float, is_keyword, normalize_range, parse_float, parse_integer},
        CommandError,
    },
    key_value_store::{Score, ScoreBound},
    resp::RespValue,
};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("ZADD", Arity::AtLeast(4), CommandKind::Write, zadd),
    CommandSpec::new("ZREM", Arity::AtLeast(3), CommandKind::Write, zrem),
    CommandSpec::new("ZSCORE", Arity::Exact(3), CommandKind::Read, zscore),
    CommandSpec::new("ZINCRBY", Arity::Exact(4), CommandKind::Write, zincrby),
    CommandSpec::new("ZCARD", Arity::Exact(2), CommandKind::Read, zcard),
    CommandSpec::new("ZCOUNT", Arity::Exact(4), CommandKind::Read, zcount),
    CommandSpec::new("ZRANK", Arity::Exact(3), CommandKind::Read, zrank),
    CommandSpec::new("ZREVRANK", Arity::Exact(3), CommandKind::Read, zrevrank),
    CommandSpec::new("ZRANGE", Arity::AtLeast(4), CommandKind::Read, zrange),
    CommandSpec::new("ZREVRANGE", Arity::AtLeast(4), CommandKind::Read, zrevrange),
    CommandSpec::new("ZRANGEBYSCORE", Arity::AtLeast(4), CommandKind::Read, zrangebyscore),
];

/// Flattens `(member, score)` pairs into a reply, interleaving the scores
/// when requested.
fn members_reply<'a>(entries: impl Iterator<Item = (&'a Bytes, f64)>, with_scores: bool) -> RespValue {
    let mut items = Vec::new();

    for (member, score) in entries {
        items.push(member.clone());
        if with_scores {
            items.push(format_float(score));
        }
    }

    RespValue::bulk_string_array(items)
}

#[derive(Debug, PartialEq)]
enum AddCondition {
    IfAbsent,
    IfPresent,
}

/// Represents the parsed arguments for ZADD command
#[derive(Debug)]
struct ZaddArguments {
    key: Bytes,
    condition: Option<AddCondition>,
    /// CH: count updated scores as well as new members.
    count_changed: bool,
    entries: Vec<(Score, Bytes)>,
}

impl ZaddArguments {
    /// Parses `key [NX | XX] [CH] score member [score member ...]`.
    ///
    /// Every score is validated before anything is written.
    fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let mut condition = None;
        let mut count_changed = false;
        let mut position = 1;

        while let Some(option) = arguments.get(position) {
            if is_keyword(option, "NX") || is_keyword(option, "XX") {
                let requested = if is_keyword(option, "NX") {
                    AddCondition::IfAbsent
                } else {
                    AddCondition::IfPresent
                };
                if condition.as_ref().is_some_and(|current| *current != requested) {
                    return Err(CommandError::SyntaxError);
                }
                condition = Some(requested);
            } else if is_keyword(option, "CH") {
                count_changed = true;
            } else {
                break;
            }
            position += 1;
        }

        let pairs = &arguments[position..];
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(CommandError::SyntaxError);
        }

        let entries = pairs
            .chunks_exact(2)
            .map(|pair| {
                let score = Score::new(parse_float(&pair[0])?).ok_or(CommandError::NotAFloat)?;
                Ok((score, pair[1].clone()))
            })
            .collect::<Result<Vec<_>, CommandError>>()?;

        Ok(Self {
            key: arguments[0].clone(),
            condition,
            count_changed,
            entries,
        })
    }
}

/// Handles the ZADD command.
///
/// Adds members or updates their scores. NX only adds new members, XX only
/// updates existing ones. Replies with the number of added members, or with
/// added plus updated members when CH is given.
fn zadd(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments)?;
    let database = context.database()?;
    let zset = database.sorted_set_entry(&zadd_arguments.key)?;

    let mut added = 0;
    let mut changed = 0;

    for (score, member) in zadd_arguments.entries {
        let existing = zset.score(&member);

        match (&zadd_arguments.condition, existing) {
            (Some(AddCondition::IfAbsent), Some(_)) | (Some(AddCondition::IfPresent), None) => {
                continue
            }
            _ => {}
        }

        match zset.insert(member, score) {
            None => added += 1,
            Some(previous) if previous != score.value() => changed += 1,
            Some(_) => {}
        }
    }

    database.remove_if_empty(&zadd_arguments.key);

    let reply = if zadd_arguments.count_changed {
        added + changed
    } else {
        added
    };

    Ok(RespValue::Integer(reply).into())
}

fn zrem(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let database = context.database()?;

    let Some(zset) = database.sorted_set_mut(&arguments[0])? else {
        return Ok(RespValue::Integer(0).into());
    };

    let removed = arguments[1..]
        .iter()
        .filter(|member| zset.remove(member))
        .count();

    database.remove_if_empty(&arguments[0]);
    Ok(RespValue::Integer(removed as i64).into())
}

fn zscore(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let score = context
        .database()?
        .sorted_set(&arguments[0])?
        .and_then(|zset| zset.score(&arguments[1]))
        .map(format_float);

    Ok(RespValue::optional_bulk_string(score).into())
}

/// Adds the increment to the member's score (0 for a new member) and replies
/// with the new score.
fn zincrby(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let increment = parse_float(&arguments[1])?;
    let database = context.database()?;
    let zset = database.sorted_set_entry(&arguments[0])?;

    let current = zset.score(&arguments[2]).unwrap_or(0.0);
    let Some(score) = Score::new(current + increment) else {
        database.remove_if_empty(&arguments[0]);
        return Err(CommandError::ScoreIsNaN);
    };
    zset.insert(arguments[2].clone(), score);

    Ok(RespValue::BulkString(format_float(score.value())).into())
}

fn zcard(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let length = context
        .database()?
        .sorted_set(&arguments[0])?
        .map_or(0, |zset| zset.len());

    Ok(RespValue::Integer(length as i64).into())
}

fn parse_score_bounds(min: &[u8], max: &[u8]) -> Result<(ScoreBound, ScoreBound), CommandError> {
    let min = ScoreBound::parse(min).ok_or(CommandError::MinOrMaxNotAFloat)?;
    let max = ScoreBound::parse(max).ok_or(CommandError::MinOrMaxNotAFloat)?;
    Ok((min, max))
}

fn zcount(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    let (min, max) = parse_score_bounds(&arguments[1], &arguments[2])?;

    let count = context
        .database()?
        .sorted_set(&arguments[0])?
        .map_or(0, |zset| zset.range_by_score(min, max).count());

    Ok(RespValue::Integer(count as i64).into())
}

fn rank(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
    reverse: bool,
) -> Result<CommandResult, CommandError> {
    let rank = context
        .database()?
        .sorted_set(&arguments[0])?
        .and_then(|zset| {
            let rank = zset.rank(&arguments[1])?;
            Some(if reverse { zset.len() - 1 - rank } else { rank })
        });

    Ok(match rank {
        Some(rank) => RespValue::Integer(rank as i64),
        None => RespValue::NullBulkString,
    }
    .into())
}

fn zrank(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    rank(context, arguments, false)
}

fn zrevrank(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    rank(context, arguments, true)
}

/// Shared by ZRANGE and ZREVRANGE: `key start stop [WITHSCORES]`, with
/// indexes taken in ascending or descending score order respectively.
fn range_by_index(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
    reverse: bool,
) -> Result<CommandResult, CommandError> {
    let start = parse_integer(&arguments[1])?;
    let stop = parse_integer(&arguments[2])?;

    let with_scores = match &arguments[3..] {
        [] => false,
        [option] if is_keyword(option, "WITHSCORES") => true,
        _ => return Err(CommandError::SyntaxError),
    };

    let Some(zset) = context.database()?.sorted_set(&arguments[0])? else {
        return Ok(RespValue::Array(Vec::new()).into());
    };

    let Some((start, stop)) = normalize_range(zset.len(), start, stop) else {
        return Ok(RespValue::Array(Vec::new()).into());
    };

    let selected = stop - start + 1;
    let reply = if reverse {
        members_reply(zset.iter().rev().skip(start).take(selected), with_scores)
    } else {
        members_reply(zset.iter().skip(start).take(selected), with_scores)
    };

    Ok(reply.into())
}

fn zrange(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    range_by_index(context, arguments, false)
}

fn zrevrange(context: &mut CommandContext<'_>, arguments: &[Bytes]) -> Result<CommandResult, CommandError> {
    range_by_index(context, arguments, true)
}

/// Represents the parsed arguments for ZRANGEBYSCORE command
struct RangeByScoreArguments {
    key: Bytes,
    min: ScoreBound,
    max: ScoreBound,
    with_scores: bool,
    /// LIMIT offset count. A negative count means no limit.
    limit: Option<(i64, i64)>,
}

impl RangeByScoreArguments {
    fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let (min, max) = parse_score_bounds(&arguments[1], &arguments[2])?;
        let mut with_scores = false;
        let mut limit = None;

        let mut options = arguments[3..].iter();
        while let Some(option) = options.next() {
            if is_keyword(option, "WITHSCORES") {
                with_scores = true;
            } else if is_keyword(option, "LIMIT") {
                let (Some(offset), Some(count)) = (options.next(), options.next()) else {
                    return Err(CommandError::SyntaxError);
                };
                limit = Some((parse_integer(offset)?, parse_integer(count)?));
            } else {
                return Err(CommandError::SyntaxError);
            }
        }

        Ok(Self {
            key: arguments[0].clone(),
            min,
            max,
            with_scores,
            limit,
        })
    }
}

/// Handles the ZRANGEBYSCORE command.
///
/// Replies with the members whose score lies between `min` and `max`, in
/// ascending score order. Each bound is inclusive unless prefixed with `(`,
/// and `-inf`/`+inf` are accepted.
fn zrangebyscore(
    context: &mut CommandContext<'_>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let range_arguments = RangeByScoreArguments::parse(arguments)?;

    let Some(zset) = context.database()?.sorted_set(&range_arguments.key)? else {
        return Ok(RespValue::Array(Vec::new()).into());
    };

    let (offset, count) = match range_arguments.limit {
        Some((offset, _)) if offset < 0 => return Ok(RespValue::Array(Vec::new()).into()),
        Some((offset, count)) => (
            offset as usize,
            usize::try_from(count).unwrap_or(usize::MAX),
        ),
        None => (0, usize::MAX),
    };

    let entries = zset
        .range_by_score(range_arguments.min, range_arguments.max)
        .skip(offset)
        .take(count);

    Ok(members_reply(entries, range_arguments.with_scores).into())
}
