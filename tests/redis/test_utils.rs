use std::{collections::VecDeque, sync::Arc};

use bytes::Bytes;
use miniredis::{
    commands::{CommandDispatcher, CommandResult},
    key_value_store::Database,
    resp::RespValue,
    state::{ClientId, ClientState, ServerState, SharedState},
};
use tokio::sync::Mutex;

/// Test utilities for simplifying command tests
pub struct TestUtils;

/// Shared state and command table, without any networking.
pub struct TestEnv {
    pub state: SharedState,
    pub dispatcher: CommandDispatcher,
    next_client_id: u64,
}

/// One simulated connection and the published messages it has received
/// but not yet looked at.
pub struct TestClient {
    pub state: ClientState,
    pushes: VecDeque<RespValue>,
}

impl TestClient {
    /// Next published message queued for this client, if any.
    pub fn next_push(&mut self) -> Option<RespValue> {
        self.state.collect_pushes();
        self.pushes.extend(self.state.take_pending_pushes());
        self.pushes.pop_front()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_databases(16)
    }

    pub fn with_databases(database_count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState::new(database_count))),
            dispatcher: CommandDispatcher::new(),
            next_client_id: 1,
        }
    }

    pub fn client(&mut self) -> TestClient {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;

        TestClient {
            state: ClientState::new(id),
            pushes: VecDeque::new(),
        }
    }

    /// Execute a command and return the raw result
    pub async fn exec(&self, client: &mut TestClient, command: &[&str]) -> CommandResult {
        self.dispatcher
            .dispatch(&self.state, &mut client.state, TestUtils::command(command))
            .await
    }

    /// Execute a command and return its reply as a single frame
    pub async fn reply(&self, client: &mut TestClient, command: &[&str]) -> RespValue {
        self.exec(client, command).await.into_frame()
    }

    /// Execute a command and assert on its reply
    pub async fn exec_expect(&self, client: &mut TestClient, command: &[&str], expected: RespValue) {
        let reply = self.reply(client, command).await;
        assert_eq!(reply, expected, "command: {:?}", command);
    }

    /// Run each `(command, expected reply)` pair in order on one client
    pub async fn exec_sequence(&self, client: &mut TestClient, test_cases: Vec<(Vec<&str>, RespValue)>) {
        for (command, expected) in test_cases {
            self.exec_expect(client, &command, expected).await;
        }
    }

    /// Run `f` on one database under the state lock
    pub async fn with_database<F, T>(&self, index: usize, f: F) -> T
    where
        F: FnOnce(&mut Database) -> T,
    {
        let mut state = self.state.lock().await;
        f(state.store.database(index).expect("database exists"))
    }
}

impl TestUtils {
    pub fn command(words: &[&str]) -> Vec<Bytes> {
        words
            .iter()
            .map(|word| Bytes::copy_from_slice(word.as_bytes()))
            .collect()
    }

    pub fn ok() -> RespValue {
        RespValue::ok()
    }

    pub fn simple(value: &str) -> RespValue {
        RespValue::SimpleString(value.to_string())
    }

    pub fn bulk(value: &str) -> RespValue {
        RespValue::BulkString(Bytes::copy_from_slice(value.as_bytes()))
    }

    pub fn nil() -> RespValue {
        RespValue::NullBulkString
    }

    pub fn integer(value: i64) -> RespValue {
        RespValue::Integer(value)
    }

    pub fn error(message: &str) -> RespValue {
        RespValue::Error(message.to_string())
    }

    pub fn bulk_array(values: &[&str]) -> RespValue {
        RespValue::Array(values.iter().map(|value| Self::bulk(value)).collect())
    }

    pub fn array(values: Vec<RespValue>) -> RespValue {
        RespValue::Array(values)
    }

    /// Sorts the elements of an array reply of bulk strings, for commands
    /// whose order is unspecified.
    pub fn sorted(reply: RespValue) -> RespValue {
        match reply {
            RespValue::Array(mut values) => {
                values.sort_by(|a, b| match (a, b) {
                    (RespValue::BulkString(a), RespValue::BulkString(b)) => a.cmp(b),
                    _ => std::cmp::Ordering::Equal,
                });
                RespValue::Array(values)
            }
            other => other,
        }
    }

    pub fn wrong_type() -> RespValue {
        Self::error("WRONGTYPE Operation against a key holding the wrong kind of value")
    }

    pub fn wrong_arguments(command: &str) -> RespValue {
        Self::error(&format!(
            "ERR wrong number of arguments for '{}' command",
            command
        ))
    }
}
