//! Command table and command implementations, one module per family.

pub mod command_dispatcher;
mod command_error;
pub mod command_handler;
pub mod command_utils;
mod connection;
mod expire;
mod hashes;
mod keys;
mod lists;
mod pub_sub;
mod sets;
mod sorted_sets;
mod strings;
pub mod transactions;

pub use command_dispatcher::{Arity, CommandDispatcher, CommandKind, CommandSpec};
pub use command_error::{CommandError, ErrorKind};
pub use command_handler::{CommandContext, CommandHandler, CommandResult, Handler};
