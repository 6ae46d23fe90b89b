//! The typed in-memory key space.
//!
//! A [`KeyValueStore`] owns a fixed number of independent [`Database`]s. Keys
//! carry an optional deadline that is checked lazily: every access to a key
//! first drops it if its deadline has passed, so expired keys are never
//! observed and no background sweep is needed.

pub mod sorted_set;

use std::{
    collections::{hash_map::RandomState, HashMap, HashSet, VecDeque},
    hash::BuildHasher,
    time::Duration,
};

use bytes::Bytes;
use thiserror::Error;
use tokio::time::Instant;

pub use sorted_set::{Score, ScoreBound, SortedSet};

use crate::glob::glob_match;

/// The value stored under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(Bytes),
    List(VecDeque<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
    Set(HashSet<Bytes>),
    SortedSet(SortedSet),
}

impl DataType {
    /// Name reported by `TYPE`.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Hash(_) => "hash",
            DataType::Set(_) => "set",
            DataType::SortedSet(_) => "zset",
        }
    }

    /// Whether the value is a container with no elements left.
    fn is_empty_container(&self) -> bool {
        match self {
            DataType::String(_) => false,
            DataType::List(list) => list.is_empty(),
            DataType::Hash(hash) => hash.is_empty(),
            DataType::Set(set) => set.is_empty(),
            DataType::SortedSet(zset) => zset.is_empty(),
        }
    }

    fn as_string(&self) -> Option<&Bytes> {
        match self {
            DataType::String(data) => Some(data),
            _ => None,
        }
    }

    fn as_string_mut(&mut self) -> Option<&mut Bytes> {
        match self {
            DataType::String(data) => Some(data),
            _ => None,
        }
    }

    fn as_list(&self) -> Option<&VecDeque<Bytes>> {
        match self {
            DataType::List(list) => Some(list),
            _ => None,
        }
    }

    fn as_list_mut(&mut self) -> Option<&mut VecDeque<Bytes>> {
        match self {
            DataType::List(list) => Some(list),
            _ => None,
        }
    }

    fn as_hash(&self) -> Option<&HashMap<Bytes, Bytes>> {
        match self {
            DataType::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    fn as_hash_mut(&mut self) -> Option<&mut HashMap<Bytes, Bytes>> {
        match self {
            DataType::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    fn as_set(&self) -> Option<&HashSet<Bytes>> {
        match self {
            DataType::Set(set) => Some(set),
            _ => None,
        }
    }

    fn as_set_mut(&mut self) -> Option<&mut HashSet<Bytes>> {
        match self {
            DataType::Set(set) => Some(set),
            _ => None,
        }
    }

    fn as_sorted_set(&self) -> Option<&SortedSet> {
        match self {
            DataType::SortedSet(zset) => Some(zset),
            _ => None,
        }
    }

    fn as_sorted_set_mut(&mut self) -> Option<&mut SortedSet> {
        match self {
            DataType::SortedSet(zset) => Some(zset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn with_expiration(data: DataType, expiration: Instant) -> Self {
        Self {
            data,
            expiration: Some(expiration),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_some_and(|deadline| deadline <= now)
    }
}

/// Raised when an operation targets a key holding another kind of value.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Operation against a key holding the wrong kind of value")]
pub struct WrongTypeError;

/// Remaining lifetime of an existing key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeToLive {
    Persistent,
    Expires(Duration),
}

/// A single numbered key space.
#[derive(Debug, Default)]
pub struct Database {
    entries: HashMap<Bytes, Value>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops `key` if its deadline has passed.
    fn purge_if_expired(&mut self, key: &[u8]) {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|value| value.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, value| !value.is_expired(now));
    }

    pub fn get(&mut self, key: &[u8]) -> Option<&Value> {
        self.purge_if_expired(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        self.purge_if_expired(key);
        self.entries.get_mut(key)
    }

    pub fn contains(&mut self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Stores `data` under `key` without a deadline, replacing whatever was
    /// there. Returns the live value that was replaced.
    pub fn insert(&mut self, key: impl Into<Bytes>, data: DataType) -> Option<Value> {
        self.insert_value(key.into(), Value::new(data))
    }

    pub fn insert_with_expiration(
        &mut self,
        key: impl Into<Bytes>,
        data: DataType,
        expiration: Instant,
    ) -> Option<Value> {
        self.insert_value(key.into(), Value::with_expiration(data, expiration))
    }

    pub fn insert_value(&mut self, key: Bytes, value: Value) -> Option<Value> {
        let now = Instant::now();
        self.entries
            .insert(key, value)
            .filter(|previous| !previous.is_expired(now))
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Value> {
        self.purge_if_expired(key);
        self.entries.remove(key)
    }

    /// Removes `key` if it holds a container that has become empty.
    pub fn remove_if_empty(&mut self, key: &[u8]) {
        if self
            .entries
            .get(key)
            .is_some_and(|value| value.data.is_empty_container())
        {
            self.entries.remove(key);
        }
    }

    /// Live keys matching the glob `pattern`.
    pub fn keys(&mut self, pattern: &[u8]) -> Vec<Bytes> {
        self.purge_expired();
        self.entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect()
    }

    pub fn len(&mut self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn random_key(&mut self) -> Option<Bytes> {
        self.purge_expired();
        if self.entries.is_empty() {
            return None;
        }

        let seed = RandomState::new().hash_one(Instant::now());
        let index = (seed % self.entries.len() as u64) as usize;
        self.entries.keys().nth(index).cloned()
    }

    /// Moves the value (and its deadline) from `from` to `to`, replacing any
    /// value at `to`. Returns `false` when `from` does not exist.
    pub fn rename(&mut self, from: &[u8], to: Bytes) -> bool {
        match self.remove(from) {
            Some(value) => {
                self.entries.insert(to, value);
                true
            }
            None => false,
        }
    }

    /// Sets or clears the deadline of an existing key. A deadline that has
    /// already passed deletes the key. Returns `false` when the key is missing.
    pub fn set_expiration(&mut self, key: &[u8], expiration: Option<Instant>) -> bool {
        let Some(value) = self.get_mut(key) else {
            return false;
        };

        value.expiration = expiration;

        if expiration.is_some_and(|deadline| deadline <= Instant::now()) {
            self.entries.remove(key);
        }

        true
    }

    /// `None` when the key does not exist.
    pub fn ttl(&mut self, key: &[u8]) -> Option<TimeToLive> {
        let value = self.get(key)?;

        Some(match value.expiration {
            Some(deadline) => {
                TimeToLive::Expires(deadline.saturating_duration_since(Instant::now()))
            }
            None => TimeToLive::Persistent,
        })
    }

    fn typed<T>(
        &mut self,
        key: &[u8],
        pick: impl FnOnce(&DataType) -> Option<&T>,
    ) -> Result<Option<&T>, WrongTypeError> {
        match self.get(key) {
            Some(value) => pick(&value.data).map(Some).ok_or(WrongTypeError),
            None => Ok(None),
        }
    }

    fn typed_mut<T>(
        &mut self,
        key: &[u8],
        pick: impl FnOnce(&mut DataType) -> Option<&mut T>,
    ) -> Result<Option<&mut T>, WrongTypeError> {
        match self.get_mut(key) {
            Some(value) => pick(&mut value.data).map(Some).ok_or(WrongTypeError),
            None => Ok(None),
        }
    }

    /// Like `typed_mut`, but creates an empty container when the key is absent.
    fn typed_entry<T>(
        &mut self,
        key: &Bytes,
        create: impl FnOnce() -> DataType,
        pick: impl FnOnce(&mut DataType) -> Option<&mut T>,
    ) -> Result<&mut T, WrongTypeError> {
        self.purge_if_expired(key);
        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::new(create()));
        pick(&mut value.data).ok_or(WrongTypeError)
    }

    pub fn string(&mut self, key: &[u8]) -> Result<Option<&Bytes>, WrongTypeError> {
        self.typed(key, DataType::as_string)
    }

    pub fn string_mut(&mut self, key: &[u8]) -> Result<Option<&mut Bytes>, WrongTypeError> {
        self.typed_mut(key, DataType::as_string_mut)
    }

    pub fn list(&mut self, key: &[u8]) -> Result<Option<&VecDeque<Bytes>>, WrongTypeError> {
        self.typed(key, DataType::as_list)
    }

    pub fn list_mut(
        &mut self,
        key: &[u8],
    ) -> Result<Option<&mut VecDeque<Bytes>>, WrongTypeError> {
        self.typed_mut(key, DataType::as_list_mut)
    }

    pub fn list_entry(&mut self, key: &Bytes) -> Result<&mut VecDeque<Bytes>, WrongTypeError> {
        self.typed_entry(key, || DataType::List(VecDeque::new()), DataType::as_list_mut)
    }

    pub fn hash(&mut self, key: &[u8]) -> Result<Option<&HashMap<Bytes, Bytes>>, WrongTypeError> {
        self.typed(key, DataType::as_hash)
    }

    pub fn hash_mut(
        &mut self,
        key: &[u8],
    ) -> Result<Option<&mut HashMap<Bytes, Bytes>>, WrongTypeError> {
        self.typed_mut(key, DataType::as_hash_mut)
    }

    pub fn hash_entry(
        &mut self,
        key: &Bytes,
    ) -> Result<&mut HashMap<Bytes, Bytes>, WrongTypeError> {
        self.typed_entry(key, || DataType::Hash(HashMap::new()), DataType::as_hash_mut)
    }

    pub fn set(&mut self, key: &[u8]) -> Result<Option<&HashSet<Bytes>>, WrongTypeError> {
        self.typed(key, DataType::as_set)
    }

    pub fn set_mut(&mut self, key: &[u8]) -> Result<Option<&mut HashSet<Bytes>>, WrongTypeError> {
        self.typed_mut(key, DataType::as_set_mut)
    }

    pub fn set_entry(&mut self, key: &Bytes) -> Result<&mut HashSet<Bytes>, WrongTypeError> {
        self.typed_entry(key, || DataType::Set(HashSet::new()), DataType::as_set_mut)
    }

    pub fn sorted_set(&mut self, key: &[u8]) -> Result<Option<&SortedSet>, WrongTypeError> {
        self.typed(key, DataType::as_sorted_set)
    }

    pub fn sorted_set_mut(&mut self, key: &[u8]) -> Result<Option<&mut SortedSet>, WrongTypeError> {
        self.typed_mut(key, DataType::as_sorted_set_mut)
    }

    pub fn sorted_set_entry(&mut self, key: &Bytes) -> Result<&mut SortedSet, WrongTypeError> {
        self.typed_entry(
            key,
            || DataType::SortedSet(SortedSet::new()),
            DataType::as_sorted_set_mut,
        )
    }
}

/// All databases of one server.
#[derive(Debug)]
pub struct KeyValueStore {
    databases: Vec<Database>,
}

impl KeyValueStore {
    pub fn new(database_count: usize) -> Self {
        Self {
            databases: (0..database_count).map(|_| Database::new()).collect(),
        }
    }

    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    pub fn database(&mut self, index: usize) -> Option<&mut Database> {
        self.databases.get_mut(index)
    }

    /// Grows or shrinks the number of databases. Dropped databases lose
    /// their contents.
    pub fn resize(&mut self, database_count: usize) {
        self.databases.resize_with(database_count, Database::new);
    }

    pub fn flush_all(&mut self) {
        self.databases.iter_mut().for_each(Database::clear);
    }

    /// Moves `key` from one database to another. Fails when the key is
    /// missing from `source` or already present in `target`.
    pub fn move_key(&mut self, source: usize, target: usize, key: &Bytes) -> bool {
        if source == target || source >= self.databases.len() || target >= self.databases.len() {
            return false;
        }

        if self.databases[target].contains(key) {
            return false;
        }

        match self.databases[source].remove(key) {
            Some(value) => {
                self.databases[target].insert_value(key.clone(), value);
                true
            }
            None => false,
        }
    }
}
