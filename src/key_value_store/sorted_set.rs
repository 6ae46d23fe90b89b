use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    ops::Bound,
};

use bytes::Bytes;

/// A sorted-set score. Never NaN, and `-0.0` is stored as `0.0` so that
/// equal scores always compare equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }

        Some(Score(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One end of a score range, as written in `ZRANGEBYSCORE`/`ZCOUNT`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    Inclusive(f64),
    Exclusive(f64),
}

impl ScoreBound {
    /// Parses `1.5`, `(1.5`, `-inf`, `+inf` and `inf`.
    pub fn parse(input: &[u8]) -> Option<Self> {
        let (exclusive, number) = match input.split_first() {
            Some((b'(', rest)) => (true, rest),
            _ => (false, input),
        };

        let value = parse_score(number)?;

        if exclusive {
            Some(ScoreBound::Exclusive(value))
        } else {
            Some(ScoreBound::Inclusive(value))
        }
    }

    fn admits_above(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(min) => score >= min,
            ScoreBound::Exclusive(min) => score > min,
        }
    }

    fn admits_below(&self, score: f64) -> bool {
        match *self {
            ScoreBound::Inclusive(max) => score <= max,
            ScoreBound::Exclusive(max) => score < max,
        }
    }
}

/// Parses a score the way clients write them, accepting the infinities.
pub fn parse_score(input: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(input).ok()?;

    let value = match text.to_ascii_lowercase().as_str() {
        "inf" | "+inf" => f64::INFINITY,
        "-inf" => f64::NEG_INFINITY,
        other => other.parse::<f64>().ok()?,
    };

    (!value.is_nan()).then_some(value)
}

/// Members ordered by score, ties broken by the member bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<Bytes, Score>,
    ordered: BTreeSet<(Score, Bytes)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates `member`. Returns the previous score, if any.
    pub fn insert(&mut self, member: Bytes, score: Score) -> Option<f64> {
        let previous = self.scores.insert(member.clone(), score);

        if let Some(old) = previous {
            self.ordered.remove(&(old, member.clone()));
        }
        self.ordered.insert((score, member));

        previous.map(|score| score.value())
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove_entry(member) {
            Some((member, score)) => {
                self.ordered.remove(&(score, member));
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).map(Score::value)
    }

    /// Zero-based position of `member` in ascending order.
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.scores.get(member)?;
        let key = (*score, Bytes::copy_from_slice(member));
        Some(self.ordered.range(..key).count())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Members in ascending order with their scores.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&Bytes, f64)> + ExactSizeIterator {
        self.ordered
            .iter()
            .map(|(score, member)| (member, score.value()))
    }

    /// Members whose score lies within `min` and `max`, ascending.
    pub fn range_by_score(
        &self,
        min: ScoreBound,
        max: ScoreBound,
    ) -> impl Iterator<Item = (&Bytes, f64)> {
        let lower = match min {
            ScoreBound::Inclusive(value) | ScoreBound::Exclusive(value) => {
                Score::new(value).unwrap_or(Score(f64::NEG_INFINITY))
            }
        };

        self.ordered
            .range((Bound::Included((lower, Bytes::new())), Bound::Unbounded))
            .map(|(score, member)| (member, score.value()))
            .skip_while(move |(_, score)| !min.admits_above(*score))
            .take_while(move |(_, score)| max.admits_below(*score))
    }
}
