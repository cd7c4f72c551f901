//! Polling loop that watches selected rewards for availability.
//!
//! Lifecycle: select once, then poll until every watched reward has been seen
//! available. A reward counts as available when its id no longer appears among
//! the limited rewards on the page. At most one reward is announced per fetch.

use crate::config::Config;
use crate::kickstarter::client::PledgeFetch;
use crate::kickstarter::extractor::RewardExtractor;
use crate::kickstarter::models::{Reward, Snapshot};
use crate::notify::{Notification, Notifier};
use crate::retry::Clock;
use crate::watch::selection::initial_selection;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a watch run ended. Every variant is a normal termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The page lists no limited rewards
    NoRewards,
    /// Nothing was selected to watch
    NothingSelected,
    /// Every watched reward became available
    Exhausted,
}

impl Outcome {
    /// Message shown to the user when the run ends, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::NoRewards => Some("No unavailable limited rewards for this Kickstarter"),
            Outcome::NothingSelected => Some("No reward selected."),
            Outcome::Exhausted => None,
        }
    }
}

/// Rewards still being watched, in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchSet {
    rewards: Vec<Reward>,
}

impl WatchSet {
    /// Creates a watch set, keeping the first occurrence of each id.
    pub fn new(rewards: Vec<Reward>) -> Self {
        let mut set = Self::default();
        for reward in rewards {
            if !set.rewards.iter().any(|r| r.id == reward.id) {
                set.rewards.push(reward);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    /// Removes and returns the first watched reward missing from `snapshot`.
    pub fn take_available(&mut self, snapshot: &Snapshot) -> Option<Reward> {
        let limited = snapshot.ids();
        let pos = self.rewards.iter().position(|r| !limited.contains(r.id.as_str()))?;
        Some(self.rewards.remove(pos))
    }
}

/// Timing and verbosity of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    pub grace_period: Duration,
    pub verbose: bool,
}

impl From<&Config> for WatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            grace_period: config.grace_period(),
            verbose: config.verbose,
        }
    }
}

/// Watches one pledge page.
pub struct Watcher<F> {
    url: String,
    extractor: RewardExtractor<F>,
    notifier: Box<dyn Notifier>,
    clock: Arc<dyn Clock>,
    settings: WatchSettings,
}

impl<F: PledgeFetch> Watcher<F> {
    pub fn new(
        url: impl Into<String>,
        extractor: RewardExtractor<F>,
        notifier: Box<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: WatchSettings,
    ) -> Self {
        Self { url: url.into(), extractor, notifier, clock, settings }
    }

    /// Fetches once, selects rewards, then polls until the selection is exhausted.
    ///
    /// `amounts` selects by price; when empty, a single limited reward is picked
    /// automatically and otherwise a menu is read from `input`.
    pub async fn run<R: BufRead, W: Write>(
        &self,
        amounts: &[f64],
        input: R,
        mut output: W,
    ) -> Result<Outcome> {
        let snapshot = self.extractor.fetch_and_parse(&self.url).await?;
        if snapshot.is_empty() {
            info!("No limited rewards on {}", self.url);
            return Ok(Outcome::NoRewards);
        }

        let selected = initial_selection(&snapshot, amounts, input, &mut output)?;
        if selected.is_empty() {
            return Ok(Outcome::NothingSelected);
        }

        self.watch(WatchSet::new(selected), snapshot, &mut output).await
    }

    /// Polls until every reward in `watch_set` has been announced.
    pub async fn watch<W: Write>(
        &self,
        mut watch_set: WatchSet,
        mut snapshot: Snapshot,
        output: &mut W,
    ) -> Result<Outcome> {
        info!("Watching {} rewards", watch_set.len());

        loop {
            if let Some(reward) = watch_set.take_available(&snapshot) {
                self.announce(&reward, output).await?;

                if watch_set.is_empty() {
                    debug!(
                        "Watch set exhausted, waiting {:?} before exit",
                        self.settings.grace_period
                    );
                    self.clock.sleep(self.settings.grace_period).await;
                    return Ok(Outcome::Exhausted);
                }

                debug!("{} rewards still watched", watch_set.len());
            }

            if self.settings.verbose {
                let minutes = self.settings.poll_interval.as_secs() / 60;
                writeln!(output, "Waiting {} minutes ...", minutes)?;
            }

            self.clock.sleep(self.settings.poll_interval).await;
            snapshot = self.extractor.fetch_and_parse(&self.url).await?;
        }
    }

    async fn announce<W: Write>(&self, reward: &Reward, output: &mut W) -> Result<()> {
        let notification = Notification {
            description: reward.description.clone(),
            url: self.url.clone(),
            detected_at: self.clock.now(),
        };

        info!("Reward {} is available", reward.id);
        writeln!(output, "{}", notification.headline())?;
        writeln!(output, "{}", notification.description)?;
        output.flush()?;

        if let Err(e) = self.notifier.notify(&notification).await {
            warn!("Notification via {} failed: {:#}", self.notifier.describe(), e);
        }

        Ok(())
    }
}
