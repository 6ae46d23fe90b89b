mod publish;
mod pubsub;
mod subscribe;

use crate::commands::command_dispatcher::{Arity, CommandKind, CommandSpec};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new(
        "SUBSCRIBE",
        Arity::AtLeast(2),
        CommandKind::Subscription,
        subscribe::subscribe,
    ),
    CommandSpec::new(
        "UNSUBSCRIBE",
        Arity::AtLeast(1),
        CommandKind::Subscription,
        subscribe::unsubscribe,
    ),
    CommandSpec::new(
        "PSUBSCRIBE",
        Arity::AtLeast(2),
        CommandKind::Subscription,
        subscribe::psubscribe,
    ),
    CommandSpec::new(
        "PUNSUBSCRIBE",
        Arity::AtLeast(1),
        CommandKind::Subscription,
        subscribe::punsubscribe,
    ),
    CommandSpec::new("PUBLISH", Arity::Exact(3), CommandKind::PubSub, publish::publish),
    CommandSpec::new("PUBSUB", Arity::AtLeast(2), CommandKind::PubSub, pubsub::pubsub),
];
