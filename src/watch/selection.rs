//! Choosing which limited rewards to watch.
//!
//! Selection happens once at startup: by amount from the command line, by
//! default when only one limited reward exists, or from a numbered menu.

use crate::kickstarter::models::{to_cents, Reward, Snapshot};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

/// Description width in the menu.
const MENU_DESCRIPTION_WIDTH: usize = 70;

/// Description width when the only reward is picked automatically.
const AUTO_DESCRIPTION_WIDTH: usize = 74;

/// Why a line of menu input was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Not a number: {0}")]
    NotANumber(String),

    #[error("No reward numbered {index} (choose 1-{count})")]
    OutOfRange { index: usize, count: usize },
}

/// Parses a line of whitespace-separated, 1-based menu numbers.
///
/// Returns 0-based indices in input order with duplicates dropped. An empty
/// line is a valid empty selection.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, SelectionError> {
    let mut indices = Vec::new();

    for token in input.split_whitespace() {
        let index: usize =
            token.parse().map_err(|_| SelectionError::NotANumber(token.to_string()))?;

        if index == 0 || index > count {
            return Err(SelectionError::OutOfRange { index, count });
        }

        if !indices.contains(&(index - 1)) {
            indices.push(index - 1);
        }
    }

    Ok(indices)
}

/// Selects every reward whose amount matches one of `amounts` to the cent.
pub fn select_by_amounts(rewards: &[Reward], amounts: &[f64]) -> Vec<Reward> {
    let wanted: Vec<u64> = amounts.iter().map(|a| to_cents(*a)).collect();

    rewards.iter().filter(|r| wanted.contains(&r.cents())).cloned().collect()
}

/// Parses pledge amounts given on the command line.
pub fn parse_amounts(args: &[String]) -> Result<Vec<f64>> {
    args.iter()
        .map(|arg| {
            let amount = arg
                .trim_start_matches('$')
                .parse::<f64>()
                .with_context(|| format!("Invalid pledge amount: {}", arg))?;
            if !amount.is_finite() || amount < 0.0 {
                anyhow::bail!("Invalid pledge amount: {}", arg);
            }
            Ok(amount)
        })
        .collect()
}

/// Formats an amount the way the page does: no cents when they are zero.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("${:.0}", amount)
    } else {
        format!("${:.2}", amount)
    }
}

/// Shows a numbered menu and reads selections until a valid line arrives.
///
/// Invalid lines re-prompt. End of input yields an empty selection.
pub fn prompt_selection<R: BufRead, W: Write>(
    rewards: &[Reward],
    mut input: R,
    mut output: W,
) -> Result<Vec<Reward>> {
    for (i, reward) in rewards.iter().enumerate() {
        writeln!(
            output,
            "{}. {} {}",
            i + 1,
            format_amount(reward.amount),
            reward.short_description(MENU_DESCRIPTION_WIDTH)
        )?;
    }

    loop {
        write!(output, "\nSelect pledge levels: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            debug!("End of input at selection prompt");
            return Ok(Vec::new());
        }

        match parse_selection(&line, rewards.len()) {
            Ok(indices) => return Ok(indices.into_iter().map(|i| rewards[i].clone()).collect()),
            Err(e) => debug!("Rejected selection {:?}: {}", line.trim(), e),
        }
    }
}

/// Builds the initial watch list from a snapshot.
pub fn initial_selection<R: BufRead, W: Write>(
    snapshot: &Snapshot,
    amounts: &[f64],
    input: R,
    mut output: W,
) -> Result<Vec<Reward>> {
    if !amounts.is_empty() {
        let selected = select_by_amounts(&snapshot.rewards, amounts);
        info!("{} rewards match the requested amounts", selected.len());
        return Ok(selected);
    }

    if let [only] = snapshot.rewards.as_slice() {
        writeln!(output, "Automatically selecting the only limited award available:")?;
        writeln!(
            output,
            "{} {}",
            format_amount(only.amount),
            only.short_description(AUTO_DESCRIPTION_WIDTH)
        )?;
        return Ok(vec![only.clone()]);
    }

    prompt_selection(&snapshot.rewards, input, output)
}
