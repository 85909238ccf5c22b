//! Ordered index over directory access counts.
//!
//! Keeps "most accessed" an O(log n) lookup instead of a scan over every
//! directory. Ties on the count resolve to the directory created first.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    count: Reverse<u64>,
    seq: u64,
    id: Uuid,
}

#[derive(Debug, Clone, Copy)]
struct Position {
    seq: u64,
    count: u64,
}

#[derive(Debug, Default)]
pub struct AccessIndex {
    ranked: BTreeSet<RankKey>,
    positions: HashMap<Uuid, Position>,
    next_seq: u64,
}

impl AccessIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory at the next creation sequence number.
    /// Returns `false` if it was already indexed.
    pub fn insert(&mut self, id: Uuid, count: u64) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.positions.insert(id, Position { seq, count });
        self.ranked.insert(RankKey {
            count: Reverse(count),
            seq,
            id,
        });
        true
    }

    pub fn set_count(&mut self, id: Uuid, count: u64) -> bool {
        let Some(pos) = self.positions.get_mut(&id) else {
            return false;
        };
        self.ranked.remove(&RankKey {
            count: Reverse(pos.count),
            seq: pos.seq,
            id,
        });
        pos.count = count;
        self.ranked.insert(RankKey {
            count: Reverse(count),
            seq: pos.seq,
            id,
        });
        true
    }

    pub fn top(&self) -> Option<Uuid> {
        self.ranked.first().map(|key| key.id)
    }

    /// Indexed ids, oldest first.
    pub fn creation_order(&self) -> Vec<Uuid> {
        let mut ordered: Vec<(u64, Uuid)> = self
            .positions
            .iter()
            .map(|(id, pos)| (pos.seq, *id))
            .collect();
        ordered.sort_unstable();
        ordered.into_iter().map(|(_, id)| id).collect()
    }
}
