//! Ordered queue of pending candidates
//!
//! The representation is fixed when the queue is created: either one flat
//! sequence shared by every scroll container, or one sequence per container
//! selector. Admission always appends; removal only ever takes a head prefix.

use std::collections::HashMap;

use crate::candidate::Candidate;
use crate::geometry::Selector;
use crate::{Error, Result};

/// How candidates are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueMode {
    /// One flat sequence; admissions carry no container key
    #[default]
    Single,
    /// One sequence per container; every admission names its container
    Keyed,
}

#[derive(Debug)]
pub enum LoadQueue {
    Single(Vec<Candidate>),
    Keyed(HashMap<Selector, Vec<Candidate>>),
}

impl LoadQueue {
    pub fn new(mode: QueueMode) -> Self {
        match mode {
            QueueMode::Single => LoadQueue::Single(Vec::new()),
            QueueMode::Keyed => LoadQueue::Keyed(HashMap::new()),
        }
    }

    pub fn mode(&self) -> QueueMode {
        match self {
            LoadQueue::Single(_) => QueueMode::Single,
            LoadQueue::Keyed(_) => QueueMode::Keyed,
        }
    }

    /// Append a candidate
    ///
    /// A single-mode queue must be given no key and a keyed queue must be
    /// given one. Mixing the two is rejected.
    pub fn push(&mut self, candidate: Candidate, key: Option<&Selector>) -> Result<()> {
        match (self, key) {
            (LoadQueue::Single(items), None) => {
                items.push(candidate);
                Ok(())
            }
            (LoadQueue::Keyed(map), Some(key)) => {
                map.entry(key.clone()).or_default().push(candidate);
                Ok(())
            }
            (LoadQueue::Single(_), Some(key)) => Err(Error::QueueMode(format!(
                "queue is in single-container mode but '{}' was given as container",
                key
            ))),
            (LoadQueue::Keyed(_), None) => Err(Error::QueueMode(
                "queue is in keyed mode and every candidate needs a container".to_string(),
            )),
        }
    }

    /// The sequence addressed by `key`, if it exists
    pub fn sequence(&self, key: Option<&Selector>) -> Option<&[Candidate]> {
        match (self, key) {
            (LoadQueue::Single(items), None) => Some(items.as_slice()),
            (LoadQueue::Keyed(map), Some(key)) => map.get(key).map(Vec::as_slice),
            _ => None,
        }
    }

    pub fn len_of(&self, key: Option<&Selector>) -> usize {
        self.sequence(key).map_or(0, <[Candidate]>::len)
    }

    pub fn total_len(&self) -> usize {
        match self {
            LoadQueue::Single(items) => items.len(),
            LoadQueue::Keyed(map) => map.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Container selectors with a sequence, sorted
    pub fn keys(&self) -> Vec<Selector> {
        match self {
            LoadQueue::Single(_) => Vec::new(),
            LoadQueue::Keyed(map) => {
                let mut keys: Vec<Selector> = map.keys().cloned().collect();
                keys.sort();
                keys
            }
        }
    }

    /// Remove the first `count` candidates of a sequence in one operation
    ///
    /// Returns how many were removed.
    pub fn remove_prefix(&mut self, key: Option<&Selector>, count: usize) -> usize {
        let items = match (self, key) {
            (LoadQueue::Single(items), None) => items,
            (LoadQueue::Keyed(map), Some(key)) => match map.get_mut(key) {
                Some(items) => items,
                None => return 0,
            },
            _ => return 0,
        };
        let count = count.min(items.len());
        items.drain(..count);
        count
    }

    /// Drop every pending candidate, keeping the mode
    pub fn clear(&mut self) {
        match self {
            LoadQueue::Single(items) => items.clear(),
            LoadQueue::Keyed(map) => map.clear(),
        }
    }
}
