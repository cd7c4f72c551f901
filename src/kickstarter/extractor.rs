//! Reward extraction: fetch a pledge page with retries, then scan it.

use crate::kickstarter::client::PledgeFetch;
use crate::kickstarter::models::Snapshot;
use crate::kickstarter::parser;
use crate::retry::{Clock, RetryPolicy};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns a pledge page URL into a snapshot of its limited rewards.
///
/// Holds no state between calls apart from its collaborators.
pub struct RewardExtractor<F> {
    fetcher: F,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl<F: PledgeFetch> RewardExtractor<F> {
    /// Creates an extractor with the default retry policy (forever, 60 s apart).
    pub fn new(fetcher: F, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(fetcher, clock, RetryPolicy::default())
    }

    /// Creates an extractor with a custom retry policy.
    pub fn with_policy(fetcher: F, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self { fetcher, clock, policy }
    }

    /// Retrieves the page body, retrying transport failures per the policy.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let fetcher = &self.fetcher;
        let delay = self.policy.delay.as_secs();

        self.policy
            .run(self.clock.as_ref(), move || async move {
                fetcher.fetch(url).await.inspect_err(|e| {
                    warn!(class = e.class(), "{}. Retrying in {} seconds", e, delay);
                })
            })
            .await
    }

    /// Scans a page body for limited rewards.
    pub fn parse(&self, html: &str) -> Snapshot {
        parser::parse(html)
    }

    /// Fetches and parses in one step.
    pub async fn fetch_and_parse(&self, url: &str) -> Result<Snapshot> {
        info!("Checking {}", url);

        let html = self.fetch(url).await?;
        let snapshot = self.parse(&html);

        debug!("{} limited rewards on page", snapshot.count());
        Ok(snapshot)
    }
}
