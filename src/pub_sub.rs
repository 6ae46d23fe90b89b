//! Channel and pattern subscription registry.
//!
//! Subscribers are identified by their [`ClientId`] and reached through the
//! push channel of their connection. Publishing only enqueues frames on those
//! unbounded channels, so a slow reader never stalls the publisher.

use std::collections::HashMap;

use bytes::Bytes;

use crate::{
    glob::glob_match,
    resp::RespValue,
    state::{ClientId, PushSender},
};

type Subscribers = HashMap<ClientId, PushSender>;

#[derive(Debug, Default)]
pub struct PubSub {
    channels: HashMap<Bytes, Subscribers>,
    patterns: HashMap<Bytes, Subscribers>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, channel: Bytes, client: ClientId, sender: PushSender) {
        self.channels.entry(channel).or_default().insert(client, sender);
    }

    pub fn unsubscribe(&mut self, channel: &[u8], client: ClientId) {
        remove_subscriber(&mut self.channels, channel, client);
    }

    pub fn psubscribe(&mut self, pattern: Bytes, client: ClientId, sender: PushSender) {
        self.patterns.entry(pattern).or_default().insert(client, sender);
    }

    pub fn punsubscribe(&mut self, pattern: &[u8], client: ClientId) {
        remove_subscriber(&mut self.patterns, pattern, client);
    }

    /// Drops every subscription held by `client`.
    pub fn remove_client(&mut self, client: ClientId) {
        for registry in [&mut self.channels, &mut self.patterns] {
            registry.retain(|_, subscribers| {
                subscribers.remove(&client);
                !subscribers.is_empty()
            });
        }
    }

    /// Delivers `message` to every exact and pattern subscriber of `channel`
    /// and returns how many deliveries were made.
    pub fn publish(&self, channel: &Bytes, message: &Bytes) -> usize {
        let mut receivers = 0;

        if let Some(subscribers) = self.channels.get(channel) {
            let frame = RespValue::bulk_string_array([
                Bytes::from_static(b"message"),
                channel.clone(),
                message.clone(),
            ]);
            receivers += deliver(subscribers, &frame);
        }

        for (pattern, subscribers) in &self.patterns {
            if !glob_match(pattern, channel) {
                continue;
            }

            let frame = RespValue::bulk_string_array([
                Bytes::from_static(b"pmessage"),
                pattern.clone(),
                channel.clone(),
                message.clone(),
            ]);
            receivers += deliver(subscribers, &frame);
        }

        receivers
    }

    /// Channels with at least one subscriber, optionally filtered by a glob.
    pub fn channels(&self, pattern: Option<&[u8]>) -> Vec<Bytes> {
        self.channels
            .keys()
            .filter(|channel| pattern.map_or(true, |pattern| glob_match(pattern, channel)))
            .cloned()
            .collect()
    }

    pub fn subscriber_count(&self, channel: &[u8]) -> usize {
        self.channels.get(channel).map_or(0, HashMap::len)
    }

    /// Number of distinct patterns with at least one subscriber.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

fn remove_subscriber(registry: &mut HashMap<Bytes, Subscribers>, name: &[u8], client: ClientId) {
    if let Some(subscribers) = registry.get_mut(name) {
        subscribers.remove(&client);
        if subscribers.is_empty() {
            registry.remove(name);
        }
    }
}

/// Queues `frame` for each subscriber. A closed receiver means its connection
/// is shutting down and will deregister itself, so it is not counted.
fn deliver(subscribers: &Subscribers, frame: &RespValue) -> usize {
    subscribers
        .values()
        .filter(|sender| sender.send(frame.clone()).is_ok())
        .count()
}
