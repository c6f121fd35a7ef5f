use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Settings;

/// Watches the request directory for work. One call to `next_file`
/// blocks until a new request or kill file shows up, or the shutdown
/// signal fires (`None`, polling stops).
///
/// Within one wake-up, `.xml` requests win over `.kill` files, so a
/// request is never silently dropped because its kill marker landed in
/// the same directory snapshot; the kill is still picked up on the next
/// cycle.
pub struct DirectoryPoller {
    settings: Arc<Settings>,
    shutdown: watch::Receiver<bool>,
    returned: HashSet<PathBuf>,
    stale_count: usize,
}

impl DirectoryPoller {
    pub fn new(settings: Arc<Settings>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            settings,
            shutdown,
            returned: HashSet::new(),
            stale_count: 0,
        }
    }

    pub async fn next_file(&mut self) -> Option<PathBuf> {
        loop {
            // Entries for files the processors have consumed are dropped
            // so the set cannot grow without bound.
            self.returned.retain(|p| p.exists());

            if let Some(path) = self.scan_requests().await {
                return Some(path);
            }
            if *self.shutdown.borrow() {
                return None;
            }
            if let Some(path) = self.scan_kills() {
                return Some(path);
            }
            self.check_stale_status();

            let interval = self.settings.poll_interval;
            if !self.pause(interval).await {
                return None;
            }
        }
    }

    /// Re-offers a file the engine declined to admit, so a later cycle
    /// returns it again instead of starving it.
    pub fn forget(&mut self, path: &Path) {
        self.returned.remove(path);
    }

    async fn scan_requests(&mut self) -> Option<PathBuf> {
        for path in list_files(&self.settings.request_dir, &["xml"]) {
            if self.returned.contains(&path) {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            if self.settings.archive_dir.join(name).exists() {
                // Re-delivery of a request we already processed.
                info!(file = %path.display(), "received and removed duplicate test request");
                self.delete_duplicate(&path).await;
                continue;
            }
            self.returned.insert(path.clone());
            return Some(path);
        }
        None
    }

    fn scan_kills(&mut self) -> Option<PathBuf> {
        for path in list_files(&self.settings.request_dir, &["kill"]) {
            if self.returned.contains(&path) {
                continue;
            }
            self.returned.insert(path.clone());
            return Some(path);
        }
        None
    }

    async fn delete_duplicate(&mut self, path: &Path) {
        if std::fs::remove_file(path).is_ok() {
            return;
        }
        let limit = self.settings.delete_retry_limit;
        let delay = self.settings.delete_retry_delay;
        for _ in 0..limit {
            if !self.pause(delay).await {
                warn!("directory poller interrupted during duplicate request cleanup");
                return;
            }
            if std::fs::remove_file(path).is_ok() {
                return;
            }
        }
        warn!(file = %path.display(), "duplicate request file could not be deleted");
    }

    /// Counts status files the orchestrator has not consumed for a while;
    /// a changing count is worth one warning line, nothing more.
    fn check_stale_status(&mut self) {
        let files = list_files(&self.settings.status_dir, &["sts", "uld"]);
        if files.is_empty() {
            return;
        }
        let stale_age = self.settings.stale_status_age;
        let old = files
            .iter()
            .filter(|p| file_age(p).is_some_and(|age| age >= stale_age))
            .count();
        if old != self.stale_count {
            warn!(
                count = old,
                dir = %self.settings.status_dir.display(),
                "unconsumed status updates are going stale"
            );
        }
        self.stale_count = old;
    }

    /// Sleeps, unless the shutdown signal fires first. `false` means stop.
    async fn pause(&mut self, duration: Duration) -> bool {
        if *self.shutdown.borrow() {
            return false;
        }
        tokio::select! {
            _ = sleep(duration) => true,
            _ = self.shutdown.changed() => false,
        }
    }
}

/// Directory enumeration order, no explicit sort: first seen wins.
fn list_files(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
        .collect()
}

fn file_age(path: &Path) -> Option<Duration> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()?
        .elapsed()
        .ok()
}
