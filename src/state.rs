use std::{collections::HashSet, sync::Arc};

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};

use crate::{
    commands::CommandHandler, key_value_store::KeyValueStore, pub_sub::PubSub, resp::RespValue,
};

/// Sending half of a connection's outbound push queue.
pub type PushSender = mpsc::UnboundedSender<RespValue>;

/// Everything shared between connections. Always accessed through
/// [`SharedState`], whose lock serializes every command.
#[derive(Debug)]
pub struct ServerState {
    pub store: KeyValueStore,
    pub pub_sub: PubSub,
}

impl ServerState {
    pub fn new(database_count: usize) -> Self {
        Self {
            store: KeyValueStore::new(database_count),
            pub_sub: PubSub::new(),
        }
    }
}

pub type SharedState = Arc<Mutex<ServerState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// Commands queued between `MULTI` and `EXEC`.
#[derive(Debug, Default)]
pub struct Transaction {
    pub commands: Vec<CommandHandler>,
    /// Set when a queued command failed validation; `EXEC` then aborts.
    pub tainted: bool,
}

/// Per-connection state. Owned by the connection task, never shared.
///
/// Published messages for this client arrive on its push queue. Commands
/// that run under the state lock first move whatever is queued into
/// `pending_pushes`, so the connection can write those messages ahead of
/// the reply and keep the order in which the server saw them.
#[derive(Debug)]
pub struct ClientState {
    pub id: ClientId,
    pub db_index: usize,
    transaction: Option<Transaction>,
    channels: HashSet<Bytes>,
    patterns: HashSet<Bytes>,
    push_sender: PushSender,
    push_receiver: mpsc::UnboundedReceiver<RespValue>,
    pending_pushes: Vec<RespValue>,
}

impl ClientState {
    pub fn new(id: ClientId) -> Self {
        let (push_sender, push_receiver) = mpsc::unbounded_channel();

        Self {
            id,
            db_index: 0,
            transaction: None,
            channels: HashSet::new(),
            patterns: HashSet::new(),
            push_sender,
            push_receiver,
            pending_pushes: Vec::new(),
        }
    }

    pub fn push_sender(&self) -> PushSender {
        self.push_sender.clone()
    }

    /// Moves every message already queued for this client into the pending
    /// list. Called with the state lock held, so nothing published later can
    /// slip in ahead of the command about to run.
    pub fn collect_pushes(&mut self) {
        while let Ok(message) = self.push_receiver.try_recv() {
            self.pending_pushes.push(message);
        }
    }

    /// Messages collected by [`ClientState::collect_pushes`], oldest first.
    pub fn take_pending_pushes(&mut self) -> Vec<RespValue> {
        std::mem::take(&mut self.pending_pushes)
    }

    /// Waits for the next published message. Cancel safe.
    pub async fn next_push(&mut self) -> Option<RespValue> {
        self.push_receiver.recv().await
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Opens a transaction. Returns `false` if one is already open.
    pub fn start_transaction(&mut self) -> bool {
        if self.transaction.is_some() {
            return false;
        }

        self.transaction = Some(Transaction::default());
        true
    }

    pub fn transaction_mut(&mut self) -> Option<&mut Transaction> {
        self.transaction.as_mut()
    }

    /// Marks the open transaction, if any, as doomed.
    pub fn taint_transaction(&mut self) {
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.tainted = true;
        }
    }

    pub fn remove_transaction(&mut self) -> Option<Transaction> {
        self.transaction.take()
    }

    /// Number of channels plus patterns this client listens to.
    pub fn subscription_count(&self) -> usize {
        self.channels.len() + self.patterns.len()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription_count() > 0
    }

    pub fn channels(&self) -> Vec<Bytes> {
        self.channels.iter().cloned().collect()
    }

    pub fn patterns(&self) -> Vec<Bytes> {
        self.patterns.iter().cloned().collect()
    }

    pub fn add_channel(&mut self, channel: Bytes) -> bool {
        self.channels.insert(channel)
    }

    pub fn remove_channel(&mut self, channel: &[u8]) -> bool {
        self.channels.remove(channel)
    }

    pub fn add_pattern(&mut self, pattern: Bytes) -> bool {
        self.patterns.insert(pattern)
    }

    pub fn remove_pattern(&mut self, pattern: &[u8]) -> bool {
        self.patterns.remove(pattern)
    }
}
