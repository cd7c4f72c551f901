//! External command notifier, and the default browser opener built on it.

use crate::notify::{Notification, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Looks up an executable by path or on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).map(|dir| dir.join(name)).find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata().map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Runs `program [args...] <url>` and waits for it to exit.
///
/// The exit status is logged but not treated as a failure.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Creates a notifier for `program <url>`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    /// Creates a notifier that passes `args` before the URL.
    pub fn with_args(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self { program: program.into(), args: args.iter().map(|a| a.to_string()).collect() }
    }

    /// Opens the URL in the desktop browser.
    pub fn browser() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("open")
        } else if cfg!(target_os = "windows") {
            Self::with_args("cmd", &["/C", "start", ""])
        } else {
            Self::new("xdg-open")
        }
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!("Running {} {}", self.program.display(), notification.url);

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&notification.url)
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        debug!("{} exited with {}", self.program.display(), status);
        Ok(())
    }

    fn describe(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().filter(|a| !a.is_empty()).cloned());
        parts.join(" ")
    }
}
