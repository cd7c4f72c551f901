//! ks-sendmail - Send the "limited pledge available" email for a URL
//!
//! Usable as the notification command of ks-watch. Delivery problems are
//! reported on stdout and never turn into a failing exit status.

use clap::Parser;
use ks_watch::config::Config;
use ks_watch::notify::EmailNotifier;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ks-sendmail",
    version,
    about = "Email a pledge URL through the configured SMTP relay"
)]
struct Cli {
    /// Pledge URL to include in the message
    url: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_target(false)
        .init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config.with_env(),
        Err(e) => {
            println!("Error: unable to send email: {:#}", e);
            return;
        }
    };

    EmailNotifier::new(config.smtp).send_and_report(cli.url.as_deref().unwrap_or_default()).await;
}
