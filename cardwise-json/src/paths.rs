use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "cardwise", "Cardwise") {
        pd.data_dir().to_path_buf()
    } else {
        // Fallback: current dir
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// `(snapshot file, backups dir)` under the platform data directory.
pub fn default_store_file() -> (PathBuf, PathBuf) {
    let root = data_root();
    (root.join("cardwise.json"), root.join("backups"))
}

/// Backups dir for a snapshot at an arbitrary path: a sibling `backups/`.
pub fn backups_for(file: &std::path::Path) -> PathBuf {
    file.parent()
        .map(|p| p.join("backups"))
        .unwrap_or_else(|| PathBuf::from("backups"))
}
