//! Sweeps uploads left behind by a crashed or killed server.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Lower bound for both the sweep period and the age of a removed upload.
const MIN_MAX_AGE: Duration = Duration::from_secs(60);

/// Starts the periodic sweep of `dir`.
///
/// Runs every `max_age`, clamped to at least a minute, and only removes uploads at least that old.
/// See [`sweep_stale_uploads`].
pub fn start_cleanup_task(dir: PathBuf, max_age: Duration) {
    let max_age = effective_max_age(max_age);
    log::info!(path:debug = dir, max_age:debug; "starting upload sweep");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(max_age);
        loop {
            interval.tick().await;
            match sweep_stale_uploads(&dir, max_age).await {
                Ok(0) => {}
                Ok(removed) => log::info!(removed; "swept stale uploads"),
                Err(e) => log::warn!(e:debug; "upload sweep failed"),
            }
        }
    });
}

fn effective_max_age(requested: Duration) -> Duration {
    if requested < MIN_MAX_AGE {
        log::warn!(requested:debug, used:debug = MIN_MAX_AGE; "upload max age too short, clamping");
    }
    requested.max(MIN_MAX_AGE)
}

/// Removes all files in `dir` that were last modified at least `max_age` ago.
///
/// Age is determined by [`std::fs::Metadata::modified`]. Returns the number of removed files.
pub async fn sweep_stale_uploads(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let mut removed = 0;
    let mut rd = tokio::fs::read_dir(dir).await?;
    let now = SystemTime::now();
    while let Some(entry) = rd.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .await?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if now.duration_since(modified).unwrap_or(Duration::ZERO) >= max_age {
            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    log::trace!(path:debug; "deleted stale upload");
                    removed += 1;
                }
                // Finished in the meantime.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
    }
    Ok(removed)
}
