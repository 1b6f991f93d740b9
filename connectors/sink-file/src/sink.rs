//! Round file layout and atomic writes.

use std::path::{Path, PathBuf};

use roundhouse_sdk::types::{PluginError, RoundUnit};

/// Records the most recent round written.
pub const LAST_ROUND_FILE: &str = "last-round";

/// `<dir>/<round:012>.json`
pub fn round_path(dir: &Path, round: u64) -> PathBuf {
    dir.join(format!("{round:012}.json"))
}

fn io_error(path: &Path, e: &std::io::Error) -> PluginError {
    PluginError::transient("IO", format!("{}: {e}", path.display()))
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PluginError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".temp");
    let temp = PathBuf::from(temp);

    tokio::fs::write(&temp, bytes)
        .await
        .map_err(|e| io_error(&temp, &e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| io_error(path, &e))
}

pub async fn write_round(dir: &Path, unit: &RoundUnit, pretty: bool) -> Result<PathBuf, PluginError> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(unit)
    } else {
        serde_json::to_vec(unit)
    }
    .map_err(|e| PluginError::data("ENCODE_FAILED", e.to_string()))?;

    let path = round_path(dir, unit.round());
    write_atomic(&path, &encoded).await?;
    write_atomic(&dir.join(LAST_ROUND_FILE), unit.round().to_string().as_bytes()).await?;
    Ok(path)
}

/// Last round recorded in `dir`, if any.
pub async fn last_round(dir: &Path) -> Result<Option<u64>, PluginError> {
    let path = dir.join(LAST_ROUND_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PluginError::data("CORRUPT_STATE", format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(&path, &e)),
    }
}
