use bytes::Bytes;
use thiserror::Error;

use crate::{key_value_store::WrongTypeError, resp::RespValue};

/// Broad category of a command failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownCommand,
    Arity,
    WrongType,
    Syntax,
    State,
    TransactionAborted,
}

/// Every failure a command can report back to the client. The `Display`
/// text is exactly the error line written on the wire.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("ERR unknown command '{name}', with args beginning with: {arguments}")]
    UnknownCommand { name: String, arguments: String },
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR unknown subcommand '{0}'. Try {1} HELP.")]
    UnknownSubcommand(String, String),
    #[error("WRONGTYPE {0}")]
    WrongType(#[from] WrongTypeError),
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error("ERR min or max is not a float")]
    MinOrMaxNotAFloat,
    #[error("ERR resulting score is not a number (NaN)")]
    ScoreIsNaN,
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("ERR increment or decrement would overflow")]
    IncrementOverflow,
    #[error("ERR hash value is not an integer")]
    HashValueNotAnInteger,
    #[error("ERR no such key")]
    NoSuchKey,
    #[error("ERR index out of range")]
    IndexOutOfRange,
    #[error("ERR DB index is out of range")]
    InvalidDatabaseIndex,
    #[error("ERR value is out of range, must be positive")]
    NotPositive,
    #[error("ERR source and destination objects are the same")]
    SameObject,
    #[error("ERR Can't execute '{0}': only (P)SUBSCRIBE / (P)UNSUBSCRIBE / PING / QUIT are allowed in this context")]
    NotAllowedWhileSubscribed(String),
    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("ERR Command not allowed inside a transaction")]
    NotAllowedInTransaction,
    #[error("EXECABORT Transaction discarded because of previous errors.")]
    ExecAbort,
}

impl CommandError {
    pub fn unknown_command(name: &str, arguments: &[Bytes]) -> Self {
        let arguments = arguments
            .iter()
            .map(|argument| format!("'{}' ", String::from_utf8_lossy(argument)))
            .collect::<String>();

        CommandError::UnknownCommand {
            name: name.to_string(),
            arguments,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            CommandError::WrongNumberOfArguments(_) => ErrorKind::Arity,
            CommandError::WrongType(_) => ErrorKind::WrongType,
            CommandError::NotAllowedWhileSubscribed(_)
            | CommandError::NestedMulti
            | CommandError::ExecWithoutMulti
            | CommandError::DiscardWithoutMulti
            | CommandError::NotAllowedInTransaction => ErrorKind::State,
            CommandError::ExecAbort => ErrorKind::TransactionAborted,
            _ => ErrorKind::Syntax,
        }
    }

    pub fn to_resp(&self) -> RespValue {
        RespValue::Error(self.to_string())
    }
}
