use cardwise_core::{Collection, CoreError, Deck, SnapshotStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub mod paths;

pub const FILE_VERSION: u32 = 1;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

#[derive(Serialize)]
struct FileImageRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    decks: &'a [Deck],
}

#[derive(Deserialize)]
struct FileImage {
    version: u32,
    decks: Vec<Deck>,
}

/// Snapshot store backed by one pretty-printed JSON file.
///
/// Saves go through a temp file in the same directory and are renamed into
/// place. The file being replaced is first copied into `backups_dir`, which
/// keeps at most `max_backups` entries.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
}

impl JsonStore {
    pub fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Self {
        Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }
}

impl SnapshotStore for JsonStore {
    fn load(&self) -> Result<Collection, CoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no snapshot yet, starting empty");
            return Ok(Collection::new());
        }
        let data = fs::read_to_string(&self.path).map_err(CoreError::storage)?;
        let img: FileImage = serde_json::from_str(&data).map_err(CoreError::storage)?;
        if img.version != FILE_VERSION {
            return Err(CoreError::Storage(format!("unsupported snapshot version {}", img.version)));
        }
        tracing::info!(path = %self.path.display(), decks = img.decks.len(), "snapshot loaded");
        Ok(Collection::from_decks(img.decks))
    }

    fn save(&self, collection: &Collection) -> Result<(), CoreError> {
        let img = FileImageRef {
            version: FILE_VERSION,
            saved_at: Utc::now(),
            decks: collection.decks(),
        };
        let json = serde_json::to_vec_pretty(&img).map_err(CoreError::storage)?;
        write_with_backup(&self.path, &self.backups_dir, self.max_backups, &json)
            .map_err(CoreError::storage)?;
        tracing::info!(path = %self.path.display(), decks = collection.decks().len(), "snapshot saved");
        Ok(())
    }
}

fn write_with_backup(path: &Path, backups_dir: &Path, max_backups: usize, json: &[u8]) -> Result<(), std::io::Error> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    if path.exists() {
        fs::create_dir_all(backups_dir)?;
        let ts = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
        let mut backup_path = backups_dir.join(format!("cardwise-{ts}.json"));
        let mut n = 1;
        while backup_path.exists() {
            backup_path = backups_dir.join(format!("cardwise-{ts}-{n}.json"));
            n += 1;
        }
        fs::copy(path, &backup_path)?;
        rotate_backups(backups_dir, max_backups)?;
    }

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(json)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().and_then(|s| s.to_str()) == Some("json")
                && p.file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|n| n.starts_with("cardwise-"))
        })
        .collect();
    // timestamped names sort chronologically
    entries.sort();
    if entries.len() > keep {
        for p in &entries[0..entries.len() - keep] {
            if let Err(e) = fs::remove_file(p) {
                tracing::warn!(path = %p.display(), error = %e, "could not remove old backup");
            }
        }
    }
    Ok(())
}
