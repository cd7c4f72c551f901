//! ks-watch - Watch a Kickstarter pledge page for sold-out rewards coming back
//!
//! Scans the pledge page for limited rewards, lets the user pick which ones
//! to watch, and fires a notification action when one becomes available.

pub mod config;
pub mod kickstarter;
pub mod notify;
pub mod retry;
pub mod watch;

pub use config::Config;
pub use kickstarter::models::{Reward, Snapshot};
pub use kickstarter::RewardExtractor;
pub use watch::{Outcome, Watcher};
