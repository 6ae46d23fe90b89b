mod discard;
pub mod exec;
mod multi;

use crate::commands::command_dispatcher::{Arity, CommandKind, CommandSpec};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("MULTI", Arity::Exact(1), CommandKind::Transaction, multi::multi),
    CommandSpec::new("EXEC", Arity::Exact(1), CommandKind::Transaction, exec::exec),
    CommandSpec::new("DISCARD", Arity::Exact(1), CommandKind::Transaction, discard::discard),
];
