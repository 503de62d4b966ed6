//! Frontier priority queue for the flood fill
//!
//! A max-heap over frontier edges keyed by reliability. Equal reliabilities
//! pop in insertion order, which keeps the traversal deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Candidate step from a visited pixel to one not yet visited
#[derive(Debug, Clone, Copy)]
pub struct FrontierEdge {
    pub from: usize,
    pub to: usize,
    pub reliability: f64,
    seq: u64,
}

impl PartialEq for FrontierEdge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEdge {}

impl PartialOrd for FrontierEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.reliability
            .total_cmp(&other.reliability)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Stable max-priority queue of [`FrontierEdge`]s
#[derive(Debug, Default)]
pub struct FrontierQueue {
    heap: BinaryHeap<FrontierEdge>,
    next_seq: u64,
}

impl FrontierQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, from: usize, to: usize, reliability: f64) {
        self.heap.push(FrontierEdge {
            from,
            to,
            reliability,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Most reliable edge; the earliest pushed wins ties
    pub fn pop(&mut self) -> Option<FrontierEdge> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
