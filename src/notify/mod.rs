//! Notification actions fired when a watched reward comes back.

pub mod command;
pub mod email;

pub use command::{find_executable, CommandNotifier};
pub use email::EmailNotifier;

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::debug;

/// Trailing argument that selects the built-in email notifier.
pub const EMAIL_KEYWORD: &str = "email";

/// A watched reward was detected as available.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Description of the reward that became available
    pub description: String,
    /// Pledge page to open
    pub url: String,
    /// When the transition was detected
    pub detected_at: DateTime<Local>,
}

impl Notification {
    /// Banner line printed on detection, e.g. `May 01, 2013 09:30 AM - Reward available!`.
    pub fn headline(&self) -> String {
        format!("{} - Reward available!", self.detected_at.format("%B %d, %Y %I:%M %p"))
    }
}

/// Trait for notification actions - enables mocking for tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Runs the action to completion.
    async fn notify(&self, notification: &Notification) -> Result<()>;

    /// Human-readable name of the action.
    fn describe(&self) -> String;
}

/// Picks the notifier from the arguments that follow the project URL.
///
/// The first argument is the notifier when it names an executable or is
/// `email`; the remaining arguments are pledge amounts. Otherwise the browser
/// opener is used and every argument is an amount.
pub fn resolve_notifier<'a>(
    args: &'a [String],
    config: &Config,
) -> (Box<dyn Notifier>, &'a [String]) {
    match args.split_first() {
        Some((first, rest)) if first == EMAIL_KEYWORD => {
            debug!("Using email notifier");
            (Box::new(EmailNotifier::new(config.smtp.clone())), rest)
        }
        Some((first, rest)) => match find_executable(first) {
            Some(program) => {
                debug!("Using command notifier: {}", program.display());
                (Box::new(CommandNotifier::new(program)), rest)
            }
            None => (Box::new(CommandNotifier::browser()), args),
        },
        None => (Box::new(CommandNotifier::browser()), args),
    }
}
