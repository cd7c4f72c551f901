//! ks-watch - Watch a Kickstarter pledge page for sold-out rewards coming back

use anyhow::{Context, Result};
use clap::Parser;
use ks_watch::config::Config;
use ks_watch::kickstarter::{pledge_url, KickstarterClient, RewardExtractor};
use ks_watch::notify::resolve_notifier;
use ks_watch::retry::{Clock, RetryPolicy, SystemClock};
use ks_watch::watch::{parse_amounts, WatchSettings, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ks-watch",
    version,
    about = "Watch a Kickstarter project for limited rewards becoming available",
    long_about = "Watch a Kickstarter project for limited rewards becoming available.\n\n\
        COMMAND is run with the pledge URL as its argument once a reward is available; \
        it defaults to opening the URL in a browser. Use `email` to send a mail instead.\n\
        If no AMOUNT is given, a menu of limited rewards is shown. \
        Specify an amount only if it is unique among pledges."
)]
struct Cli {
    /// URL of the Kickstarter project
    project_url: String,

    /// Notification command and/or pledge amounts to watch
    #[arg(value_name = "COMMAND|AMOUNT")]
    args: Vec<String>,

    /// Delay, in minutes, between each check
    #[arg(short, long)]
    delay: Option<u64>,

    /// Print a message before each delay
    #[arg(short, long)]
    verbose: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long)]
    proxy: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(delay) = cli.delay {
        config.delay_minutes = delay;
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    let (notifier, amount_args) = resolve_notifier(&cli.args, &config);
    println!("Command: {}", notifier.describe());

    let amounts = parse_amounts(amount_args)?;
    let url = pledge_url(&cli.project_url);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let client = KickstarterClient::new(&config).context("Failed to create HTTP client")?;
    let extractor = RewardExtractor::with_policy(
        client,
        Arc::clone(&clock),
        RetryPolicy::forever(config.retry_delay()),
    );
    let watcher = Watcher::new(url, extractor, notifier, clock, WatchSettings::from(&config));

    let stdin = std::io::stdin();
    let outcome = watcher.run(&amounts, stdin.lock(), std::io::stdout()).await?;

    if let Some(message) = outcome.message() {
        println!("{}", message);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_positionals() {
        let cli = Cli::try_parse_from(["ks-watch", "https://ks.example/p", "email", "75"]).unwrap();
        assert_eq!(cli.project_url, "https://ks.example/p");
        assert_eq!(cli.args, vec!["email", "75"]);
        assert!(cli.delay.is_none());
    }

    #[test]
    fn test_cli_ignores_malformed_delay_env() {
        let original = std::env::var("KSWATCH_DELAY").ok();
        std::env::set_var("KSWATCH_DELAY", "soon");

        let cli = Cli::try_parse_from(["ks-watch", "https://ks.example/p"]);

        match original {
            Some(v) => std::env::set_var("KSWATCH_DELAY", v),
            None => std::env::remove_var("KSWATCH_DELAY"),
        }

        assert!(cli.unwrap().delay.is_none());
    }

    #[test]
    fn test_cli_delay_flag() {
        let cli =
            Cli::try_parse_from(["ks-watch", "-d", "5", "-v", "https://ks.example/p"]).unwrap();
        assert_eq!(cli.delay, Some(5));
        assert!(cli.verbose);
    }
}
