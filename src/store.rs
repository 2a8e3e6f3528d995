use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::model::{MapEntry, Note};

pub const NOTES_KEY: &str = "notes";
pub const MAP_DATA_KEY: &str = "mapData";
pub const MAP_VERSION_KEY: &str = "mapVersion";
pub const THEME_KEY: &str = "theme";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// String-valued key-value persistence: one file per key under the data
/// directory. Writes are atomic; a failed write leaves the previous value.
#[derive(Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("create data dir {}", data_dir.display()))?;
        Ok(Self {
            root: data_dir.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.root.join(key);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        Ok(Some(s))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        write_atomic(&self.root.join(key), value.as_bytes())
            .with_context(|| format!("write {}", key))
    }

    pub fn load_notes(&self) -> Result<Vec<Note>> {
        match self.get(NOTES_KEY)? {
            None => Ok(Vec::new()),
            Some(s) => serde_json::from_str(&s).context("parse notes"),
        }
    }

    pub fn save_notes(&self, notes: &[Note]) -> Result<()> {
        let s = serde_json::to_string(notes).context("serialize notes")?;
        self.set(NOTES_KEY, &s)
    }

    pub fn load_map_data(&self) -> Result<Option<Vec<MapEntry>>> {
        match self.get(MAP_DATA_KEY)? {
            None => Ok(None),
            Some(s) => {
                let entries: Vec<MapEntry> = serde_json::from_str(&s).context("parse mapData")?;
                Ok(Some(entries))
            }
        }
    }

    pub fn save_map_data(&self, entries: &[MapEntry]) -> Result<()> {
        let s = serde_json::to_string(entries).context("serialize mapData")?;
        self.set(MAP_DATA_KEY, &s)
    }

    /// Index of the next unapplied catalog migration. Missing or garbled
    /// values read as zero so the whole chain re-runs (each step is a pure,
    /// re-appliable transform).
    pub fn load_map_version(&self) -> Result<usize> {
        match self.get(MAP_VERSION_KEY)? {
            None => Ok(0),
            Some(s) => Ok(s.trim().parse().unwrap_or(0)),
        }
    }

    pub fn save_map_version(&self, version: usize) -> Result<()> {
        self.set(MAP_VERSION_KEY, &version.to_string())
    }

    pub fn load_theme(&self) -> Result<Theme> {
        match self.get(THEME_KEY)?.as_deref().map(str::trim) {
            Some("light") => Ok(Theme::Light),
            _ => Ok(Theme::Dark),
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.set(THEME_KEY, theme.as_str())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("no parent for {}", path.display()))?;
    fs::create_dir_all(parent).context("create parent directories")?;
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
