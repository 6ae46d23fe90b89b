use bytes::Bytes;
use tracing::debug;

use crate::{
    commands::{
        command_dispatcher::CommandDispatcher,
        command_handler::{CommandContext, CommandResult},
        CommandError,
    },
    resp::RespValue,
    state::{ClientState, SharedState},
};

/// EXEC outside of a transaction. Inside one, the dispatcher calls
/// [`run_transaction`] instead.
pub fn exec(
    _context: &mut CommandContext<'_>,
    _arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    Err(CommandError::ExecWithoutMulti)
}

/// Runs every queued command of `client` as one block.
///
/// The state lock is held for the whole block, so no other connection's
/// command can interleave with it. Each command contributes one element to
/// the reply array, errors included. A tainted transaction runs nothing and
/// replies EXECABORT.
pub async fn run_transaction(
    dispatcher: &CommandDispatcher,
    state: &SharedState,
    client: &mut ClientState,
) -> CommandResult {
    let Some(transaction) = client.remove_transaction() else {
        return CommandError::ExecWithoutMulti.to_resp().into();
    };

    if transaction.tainted {
        debug!(client = client.id.0, "transaction aborted");
        return CommandError::ExecAbort.to_resp().into();
    }

    let mut state_guard = state.lock().await;
    client.collect_pushes();
    let mut responses = Vec::with_capacity(transaction.commands.len());

    for command in &transaction.commands {
        let response = match dispatcher.validate(command) {
            Ok(spec) => dispatcher
                .execute(spec, &mut state_guard, client, &command.arguments)
                .into_frame(),
            Err(error) => error.to_resp(),
        };

        responses.push(response);
    }

    RespValue::Array(responses).into()
}
