/*!
 * Allocation Order Tracker
 * Order in which processes most recently entered physical memory
 */

use crate::core::types::Pid;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// FIFO queue of resident process ids, oldest first
///
/// Holds each id at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationOrder {
    queue: VecDeque<Pid>,
}

impl AllocationOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `pid` unless it is already queued
    pub fn push(&mut self, pid: Pid) -> bool {
        if self.contains(pid) {
            return false;
        }
        self.queue.push_back(pid);
        true
    }

    /// Remove `pid` wherever it sits
    pub fn remove(&mut self, pid: Pid) -> bool {
        match self.queue.iter().position(|&p| p == pid) {
            Some(pos) => {
                self.queue.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn front(&self) -> Option<Pid> {
        self.queue.front().copied()
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.queue.contains(&pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pid> + '_ {
        self.queue.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn to_vec(&self) -> Vec<Pid> {
        self.queue.iter().copied().collect()
    }
}

impl FromIterator<Pid> for AllocationOrder {
    fn from_iter<I: IntoIterator<Item = Pid>>(iter: I) -> Self {
        let mut order = AllocationOrder::new();
        for pid in iter {
            order.push(pid);
        }
        order
    }
}
