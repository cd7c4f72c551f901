//! Reward selection and the polling loop.

pub mod selection;
pub mod watcher;

pub use selection::{
    initial_selection, parse_amounts, parse_selection, select_by_amounts, SelectionError,
};
pub use watcher::{Outcome, WatchSet, WatchSettings, Watcher};
