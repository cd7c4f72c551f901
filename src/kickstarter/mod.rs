//! Kickstarter pledge page retrieval, parsing, and reward models.

pub mod client;
pub mod extractor;
pub mod markers;
pub mod models;
pub mod parser;

pub use client::{pledge_url, FetchError, KickstarterClient, PledgeFetch};
pub use extractor::RewardExtractor;
pub use models::{Reward, Snapshot};
pub use parser::RewardScanner;
