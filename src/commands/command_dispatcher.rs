use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use crate::{
    commands::{
        command_handler::{CommandContext, CommandHandler, CommandResult, Handler},
        connection, expire, hashes, keys, lists, pub_sub, sets, sorted_sets, strings,
        transactions, CommandError,
    },
    resp::RespValue,
    state::{ClientState, ServerState, SharedState},
};

/// Number of words a command accepts, counting the command name itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, words: usize) -> bool {
        match *self {
            Arity::Exact(expected) => words == expected,
            Arity::AtLeast(minimum) => words >= minimum,
        }
    }
}

/// Side-effect class of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Read,
    Write,
    /// Publishing and registry introspection.
    PubSub,
    /// (P)SUBSCRIBE and (P)UNSUBSCRIBE.
    Subscription,
    Connection,
    Transaction,
}

/// One entry of the command table.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub kind: CommandKind,
    pub allowed_while_subscribed: bool,
    pub handler: Handler,
}

impl CommandSpec {
    pub const fn new(name: &'static str, arity: Arity, kind: CommandKind, handler: Handler) -> Self {
        Self {
            name,
            arity,
            kind,
            allowed_while_subscribed: matches!(kind, CommandKind::Subscription),
            handler,
        }
    }

    pub const fn allowed_while_subscribed(mut self) -> Self {
        self.allowed_while_subscribed = true;
        self
    }

    fn display_name(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("kind", &self.kind)
            .field("allowed_while_subscribed", &self.allowed_while_subscribed)
            .finish()
    }
}

/// Name to handler table, built once at startup, plus the rules that apply
/// before any handler runs: validation, subscribed mode and transaction
/// queuing.
#[derive(Debug)]
pub struct CommandDispatcher {
    commands: HashMap<&'static str, CommandSpec>,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDispatcher {
    pub fn new() -> Self {
        let mut dispatcher = Self {
            commands: HashMap::new(),
        };

        let families = [
            connection::COMMANDS,
            keys::COMMANDS,
            expire::COMMANDS,
            strings::COMMANDS,
            lists::COMMANDS,
            hashes::COMMANDS,
            sets::COMMANDS,
            sorted_sets::COMMANDS,
            pub_sub::COMMANDS,
            transactions::COMMANDS,
        ];

        for spec in families.into_iter().flatten() {
            dispatcher.register(*spec);
        }

        dispatcher
    }

    /// Adds or replaces a command. Names are stored upper-cased.
    pub fn register(&mut self, spec: CommandSpec) {
        self.commands.insert(spec.name, spec);
    }

    pub fn lookup(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name.to_ascii_uppercase().as_str())
    }

    /// Checks that the command exists and got an acceptable number of words.
    pub fn validate(&self, command: &CommandHandler) -> Result<&CommandSpec, CommandError> {
        let spec = self
            .commands
            .get(command.lookup_name().as_str())
            .ok_or_else(|| CommandError::unknown_command(&command.name, &command.arguments))?;

        if !spec.arity.accepts(command.arguments.len() + 1) {
            return Err(CommandError::WrongNumberOfArguments(spec.display_name()));
        }

        Ok(spec)
    }

    /// Runs one request for `client`, returning what the connection should
    /// write. Failures are already turned into error replies.
    pub async fn dispatch(
        &self,
        state: &SharedState,
        client: &mut ClientState,
        request: Vec<Bytes>,
    ) -> CommandResult {
        let command = CommandHandler::new(request);

        let spec = match self.validate(&command) {
            Ok(spec) => spec,
            Err(error) => {
                debug!(
                    client = client.id.0,
                    command = %command.name,
                    kind = ?error.kind(),
                    "rejected: {}",
                    error
                );
                client.taint_transaction();
                return error.to_resp().into();
            }
        };

        if client.is_subscribed() && !spec.allowed_while_subscribed {
            return CommandError::NotAllowedWhileSubscribed(spec.display_name())
                .to_resp()
                .into();
        }

        if let Some(transaction) = client.transaction_mut() {
            match spec.name {
                "EXEC" => return transactions::exec::run_transaction(self, state, client).await,
                "MULTI" => return CommandError::NestedMulti.to_resp().into(),
                "DISCARD" | "QUIT" => {}
                _ if spec.kind == CommandKind::Subscription => {
                    transaction.tainted = true;
                    return CommandError::NotAllowedInTransaction.to_resp().into();
                }
                _ => {
                    transaction.commands.push(command);
                    return RespValue::SimpleString("QUEUED".to_string()).into();
                }
            }
        }

        let mut state_guard = state.lock().await;
        client.collect_pushes();
        self.execute(spec, &mut state_guard, client, &command.arguments)
    }

    /// Invokes the handler of an already validated command. The caller holds
    /// the state lock.
    pub fn execute(
        &self,
        spec: &CommandSpec,
        state: &mut ServerState,
        client: &mut ClientState,
        arguments: &[Bytes],
    ) -> CommandResult {
        let mut context = CommandContext { state, client };

        match (spec.handler)(&mut context, arguments) {
            Ok(result) => result,
            Err(error) => {
                debug!(
                    client = context.client.id.0,
                    command = spec.name,
                    kind = ?error.kind(),
                    "failed: {}",
                    error
                );
                error.to_resp().into()
            }
        }
    }
}
