//! Data models for reward tiers and availability snapshots.

use std::collections::HashSet;

/// A limited reward tier as it appeared on one fetch of the pledge page.
#[derive(Debug, Clone, PartialEq)]
pub struct Reward {
    /// Pledge price
    pub amount: f64,
    /// Reward identifier, stable across fetches
    pub id: String,
    /// Whitespace-collapsed ASCII title
    pub description: String,
}

impl Reward {
    /// Creates a reward, rejecting an empty id or a negative/non-finite amount.
    pub fn new(amount: f64, id: impl Into<String>, description: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() || !amount.is_finite() || amount < 0.0 {
            return None;
        }
        Some(Self { amount, id, description: description.into() })
    }

    /// Amount in whole cents, used for matching against command-line amounts.
    pub fn cents(&self) -> u64 {
        to_cents(self.amount)
    }

    /// Description cut to at most `max` characters.
    pub fn short_description(&self, max: usize) -> &str {
        match self.description.char_indices().nth(max) {
            Some((idx, _)) => &self.description[..idx],
            None => &self.description,
        }
    }
}

/// Converts a currency value to whole cents.
pub fn to_cents(amount: f64) -> u64 {
    (amount * 100.0).round() as u64
}

/// Every limited reward present on one fetch, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub rewards: Vec<Reward>,
}

impl Snapshot {
    pub fn new(rewards: Vec<Reward>) -> Self {
        Self { rewards }
    }

    /// Returns number of limited rewards.
    pub fn count(&self) -> usize {
        self.rewards.len()
    }

    /// Returns true if no limited rewards were found.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Returns true if a reward with this id is still limited.
    pub fn contains(&self, id: &str) -> bool {
        self.rewards.iter().any(|r| r.id == id)
    }

    /// Ids of every limited reward in this snapshot.
    pub fn ids(&self) -> HashSet<&str> {
        self.rewards.iter().map(|r| r.id.as_str()).collect()
    }
}
