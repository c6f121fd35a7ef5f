use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::instructions::{DataKind, Direction};

/// Moves processed files into the archive directory. The copy half is
/// plain I/O; the delete half tolerates another process still holding the
/// source open by retrying once per second for a bounded time, then
/// logging and giving up without failing the caller.
#[derive(Debug, Clone)]
pub struct ArchiveManager {
    archive_dir: PathBuf,
    retry_limit: u32,
    retry_delay: Duration,
}

impl ArchiveManager {
    pub fn new(archive_dir: PathBuf, retry_limit: u32, retry_delay: Duration) -> Self {
        Self {
            archive_dir,
            retry_limit,
            retry_delay,
        }
    }

    /// Copies `path` into the archive under the same basename, then
    /// deletes the source. A source that no longer exists is not an
    /// error; a source that cannot be deleted after the retries is
    /// logged and left behind.
    pub async fn archive(&self, path: &Path) -> io::Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::other(format!("not a file: {}", path.display())))?;
        std::fs::copy(path, self.archive_dir.join(name))?;

        if std::fs::remove_file(path).is_ok() {
            debug!(file = %path.display(), "archived");
            return Ok(());
        }
        for _ in 0..self.retry_limit {
            sleep(self.retry_delay).await;
            if std::fs::remove_file(path).is_ok() {
                debug!(file = %path.display(), "archived after delayed delete");
                return Ok(());
            }
        }
        warn!(file = %path.display(), "could not delete archived source file");
        Ok(())
    }
}

/// Writes one uploaded artifact as `<upload_id>.uld` in the status
/// directory, raw content bytes only.
pub fn upload_data(
    direction: Direction,
    kind: DataKind,
    content: &str,
    upload_id: &str,
    dest_dir: &Path,
) -> io::Result<()> {
    let target = dest_dir.join(format!("{upload_id}.uld"));
    std::fs::write(&target, content.as_bytes())?;
    debug!(file = %target.display(), %direction, %kind, "uploaded artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_archive_moves_file() {
        let root = tempfile::tempdir().unwrap();
        let archive_dir = root.path().join("archive");
        std::fs::create_dir(&archive_dir).unwrap();
        let source = root.path().join("Req-T1.xml");
        std::fs::write(&source, b"descriptor").unwrap();

        let manager = ArchiveManager::new(archive_dir.clone(), 2, Duration::from_millis(1));
        manager.archive(&source).await.unwrap();

        assert!(!source.exists());
        assert_eq!(
            std::fs::read(archive_dir.join("Req-T1.xml")).unwrap(),
            b"descriptor"
        );
    }

    #[tokio::test]
    async fn test_archive_missing_source_is_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        let manager =
            ArchiveManager::new(root.path().to_path_buf(), 2, Duration::from_millis(1));
        manager.archive(&root.path().join("gone.xml")).await.unwrap();
    }

    #[test]
    fn test_upload_writes_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        upload_data(
            Direction::Sent,
            DataKind::FhirId,
            "ABCDEFGHIJKLMNOP",
            "U1",
            dir.path(),
        )
        .unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("U1.uld")).unwrap(),
            b"ABCDEFGHIJKLMNOP"
        );
    }
}
