//! Best-effort diagnostic log for failures that made the redirect fall back to the local prompt.

use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only error log file. Write failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log at `~/.claude/logs/slack-notify.log`.
    pub fn default_location() -> Self {
        Self::new(default_log_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `<timestamp> [ERROR] <message>` followed by the error's cause chain.
    pub fn record(&self, error: &anyhow::Error) {
        if let Err(e) = self.append(error) {
            log::error!(
                "could not write to log file {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn append(&self, error: &anyhow::Error) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut trace = String::new();
        for (i, cause) in error.chain().enumerate() {
            trace.push_str(&format!("    {}: {}\n", i, cause));
        }
        let entry = format!(
            "{} [ERROR] {}\n{}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            error,
            trace
        );
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }
}

fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".claude").join("logs").join("slack-notify.log"))
        .unwrap_or_else(|| PathBuf::from("slack-notify.log"))
}
