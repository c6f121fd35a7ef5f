use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the daemon: the four well-known directories,
/// the local participant identity, and the timing knobs of the polling and
/// retry loops. Production values come from the CLI; tests shrink the
/// intervals to keep the suites fast.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Incoming `Req-<id>.xml` / `Req-<id>.kill` files.
    pub request_dir: PathBuf,
    /// Outgoing `*_P.sts` / `*_N.sts` status events and `*.uld` uploads.
    pub status_dir: PathBuf,
    /// Processed request files and consumed payload bundles.
    pub archive_dir: PathBuf,
    /// Resource bundles referenced by a transmission.
    pub payload_dir: PathBuf,
    /// The identifier this installation goes by in request descriptors.
    pub participant_id: String,
    /// Move consumed payload bundles into the archive after a test.
    pub delete_payload: bool,

    pub poll_interval: Duration,
    pub stale_status_age: Duration,
    pub delete_retry_limit: u32,
    pub delete_retry_delay: Duration,
    pub conflict_retry_limit: u32,
    pub conflict_retry_delay: Duration,
}

impl Settings {
    pub fn new(
        request_dir: PathBuf,
        status_dir: PathBuf,
        archive_dir: PathBuf,
        payload_dir: PathBuf,
        participant_id: impl Into<String>,
    ) -> Self {
        Self {
            request_dir,
            status_dir,
            archive_dir,
            payload_dir,
            participant_id: participant_id.into(),
            delete_payload: false,
            poll_interval: Duration::from_secs(3),
            stale_status_age: Duration::from_secs(5 * 60),
            delete_retry_limit: 60,
            delete_retry_delay: Duration::from_secs(1),
            conflict_retry_limit: 5,
            conflict_retry_delay: Duration::from_secs(30),
        }
    }

    /// Creates any of the four directories that do not exist yet.
    pub fn ensure_directories(&self) -> io::Result<()> {
        for dir in [
            &self.request_dir,
            &self.status_dir,
            &self.archive_dir,
            &self.payload_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_directories_creates_missing() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::new(
            root.path().join("requests"),
            root.path().join("status"),
            root.path().join("archive"),
            root.path().join("payload"),
            "NewPayer",
        );

        settings.ensure_directories().unwrap();

        assert!(settings.request_dir.is_dir());
        assert!(settings.status_dir.is_dir());
        assert!(settings.archive_dir.is_dir());
        assert!(settings.payload_dir.is_dir());
    }
}
