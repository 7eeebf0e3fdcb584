//! Crawl frontier: a FIFO queue plus the visited and queued sets
//!
//! A frontier lives for a single crawl. A URL is handed out at most once,
//! and a URL that has been visited or is waiting in the queue is never
//! queued again.

use std::collections::{HashSet, VecDeque};

/// In-memory breadth-first frontier
#[derive(Debug, Default)]
pub struct Frontier {
    to_visit: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier holding only `seed`
    pub fn new(seed: impl Into<String>) -> Self {
        let mut frontier = Self::default();
        frontier.enqueue(seed);
        frontier
    }

    /// Pops the next unvisited URL and marks it visited
    ///
    /// Entries that were visited while waiting in the queue are skipped.
    pub fn pop_next(&mut self) -> Option<String> {
        while let Some(url) = self.to_visit.pop_front() {
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                return Some(url);
            }
        }
        None
    }

    /// Appends `url` to the queue unless it is already visited or queued
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.to_visit.push_back(url);
        true
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.to_visit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_visit.is_empty()
    }

    /// Number of URLs handed out so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }
}
