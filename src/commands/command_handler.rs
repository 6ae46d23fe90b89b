use bytes::Bytes;

use crate::{
    commands::CommandError,
    key_value_store::Database,
    resp::RespValue,
    state::{ClientState, ServerState},
};

/// What a command asks the connection to do once it ran.
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Write a single reply frame.
    Response(RespValue),
    /// Write several frames in order (one per (un)subscription).
    Replies(Vec<RespValue>),
    /// Write the frame, then close the connection.
    Close(RespValue),
}

impl CommandResult {
    /// Collapses the result into one frame, as used for `EXEC` results.
    pub fn into_frame(self) -> RespValue {
        match self {
            CommandResult::Response(frame) | CommandResult::Close(frame) => frame,
            CommandResult::Replies(frames) => RespValue::Array(frames),
        }
    }
}

impl From<RespValue> for CommandResult {
    fn from(frame: RespValue) -> Self {
        CommandResult::Response(frame)
    }
}

/// A request split into its command name and arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    /// The name exactly as the client sent it.
    pub name: String,
    pub arguments: Vec<Bytes>,
}

impl CommandHandler {
    pub fn new(request: Vec<Bytes>) -> Self {
        let mut parts = request.into_iter();
        let name = parts
            .next()
            .map(|name| String::from_utf8_lossy(&name).into_owned())
            .unwrap_or_default();

        Self {
            name,
            arguments: parts.collect(),
        }
    }

    /// Upper-cased name used for the registry lookup.
    pub fn lookup_name(&self) -> String {
        self.name.to_ascii_uppercase()
    }
}

/// What a command handler may touch: the shared state (already locked by
/// the dispatcher) and the state of the requesting connection.
pub struct CommandContext<'a> {
    pub state: &'a mut ServerState,
    pub client: &'a mut ClientState,
}

impl CommandContext<'_> {
    /// The database selected by the requesting connection.
    pub fn database(&mut self) -> Result<&mut Database, CommandError> {
        self.state
            .store
            .database(self.client.db_index)
            .ok_or(CommandError::InvalidDatabaseIndex)
    }
}

/// Signature shared by every command implementation. `arguments` excludes
/// the command name.
pub type Handler = fn(&mut CommandContext<'_>, &[Bytes]) -> Result<CommandResult, CommandError>;
