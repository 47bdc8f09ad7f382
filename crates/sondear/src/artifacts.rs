//! Test artifact output.
//!
//! Screenshots, traces, and accessibility reports land in per-kind
//! directories with timestamped file names, so repeated runs never
//! overwrite each other.

use std::path::{Path, PathBuf};

use crate::result::SondearResult;

/// Directory for failure and on-demand screenshots
pub const SCREENSHOT_DIR: &str = "screenshots";

/// Directory for scenario traces
pub const TRACE_DIR: &str = "traces";

/// Directory for accessibility reports
pub const REPORT_DIR: &str = "accessibility-reports";

/// Timestamp fragment for artifact file names. Millisecond precision keeps
/// artifacts written in quick succession from colliding.
#[must_use]
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S%.3f").to_string()
}

/// Write an artifact, creating its directory if needed. Returns the full
/// path written.
pub async fn write_artifact(
    dir: impl AsRef<Path>,
    file_name: &str,
    bytes: &[u8],
) -> SondearResult<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    tracing::info!(path = %path.display(), "artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp();
        // YYYYMMDD-HHMMSS.mmm
        assert_eq!(ts.len(), 19);
        assert_eq!(ts.as_bytes()[8], b'-');
        assert_eq!(ts.as_bytes()[15], b'.');
        assert!(ts.chars().filter(|c| c.is_ascii_digit()).count() == 17);
    }

    #[test]
    fn test_rapid_timestamps_do_not_collide() {
        let first = timestamp();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = timestamp();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_write_artifact_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("screenshots");
        let path = write_artifact(&dir, "shot.png", b"png-bytes").await.unwrap();
        assert!(path.exists());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png-bytes");
    }
}
