use std::path::PathBuf;

use directories::ProjectDirs;

#[derive(Debug, thiserror::Error)]
pub enum AssetDirError {
    #[error("could not resolve a home directory for application data")]
    NoHomeDirectory,
    #[error("failed to create asset directory {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Directory holding the SQLite database and the optional `config.toml`.
///
/// Debug builds keep everything under `dev_assets/` at the workspace root so
/// local runs never touch the real data directory.
pub fn asset_dir() -> Result<PathBuf, AssetDirError> {
    let path = if cfg!(debug_assertions) {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../dev_assets")
    } else {
        ProjectDirs::from("app", "massage-booking", "massage-booking")
            .ok_or(AssetDirError::NoHomeDirectory)?
            .data_dir()
            .to_path_buf()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).map_err(|source| AssetDirError::Create {
            path: path.clone(),
            source,
        })?;
    }

    Ok(path)
}
