//! Shared setup: start the relay binary with a shell script as its tool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Child;

pub struct Relay {
    pub child: Child,
    pub base_url: String,
    pub upload_dir: PathBuf,
    // Keeps the tool script and the upload directory alive.
    _dir: TempDir,
}

/// Starts the relay binary, invoking `sh <script>` for every submission.
pub async fn spawn_relay(script: &str) -> anyhow::Result<Relay> {
    let dir = tempfile::tempdir()?;
    let script_path = dir.path().join("tool.sh");
    std::fs::write(&script_path, script)?;
    let upload_dir = dir.path().join("uploads");

    // IANA recommended port range.
    let port = fastrand::u16(49152..65535);
    let child = tokio::process::Command::new(env!("CARGO_BIN_EXE_ytrelay-server"))
        .kill_on_drop(true)
        .args(["--host", "127.0.0.1"])
        .args(["--port", &port.to_string()])
        .args(["--tool", "sh"])
        .arg("--tool-arg")
        .arg(&script_path)
        .arg("--upload-dir")
        .arg(&upload_dir)
        .arg("--static-dir")
        .arg(static_dir())
        .spawn()?;

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await?;

    Ok(Relay {
        child,
        base_url,
        upload_dir,
        _dir: dir,
    })
}

pub fn static_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

async fn wait_until_ready(base_url: &str) -> anyhow::Result<()> {
    let health = format!("{base_url}/health");
    for _ in 0..100 {
        if let Ok(response) = reqwest::get(&health).await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("relay did not come up at {base_url}")
}
