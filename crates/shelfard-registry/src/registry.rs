//! File-backed snapshot store
//!
//! Layout: `<root>/<name>/v<version>.json`, one serialized [`Schema`] per file.
//! Versions are never overwritten; a new snapshot always gets `latest + 1`.

use chrono::{DateTime, Utc};
use regex::Regex;
use shelfard_core::{Column, Schema};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::error::RegistryError;
use crate::naming::validate_name;

static SNAPSHOT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+)\.json$").expect("valid regex"));

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Metadata about one stored snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub name: String,
    pub version: u32,
    pub captured_at: DateTime<Utc>,
    pub top_level_columns: usize,
    pub fingerprint: String,
    pub path: PathBuf,
}

/// Versioned schema snapshots on disk
#[derive(Debug, Clone)]
pub struct SnapshotRegistry {
    root: PathBuf,
}

impl SnapshotRegistry {
    /// Open (and create if needed) a registry rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record a new snapshot for `name` as the next version
    pub fn save(&self, name: &str, root: Column) -> Result<Schema> {
        validate_name(name)?;
        let next = self.versions(name)?.last().copied().unwrap_or(0) + 1;
        let schema = Schema::new(name, next, root);
        self.store(&schema)?;
        Ok(schema)
    }

    /// Write a fully-formed schema under its own name and version
    pub fn store(&self, schema: &Schema) -> Result<PathBuf> {
        validate_name(&schema.name)?;
        schema.validate()?;

        let dir = self.root.join(&schema.name);
        fs::create_dir_all(&dir)?;

        let path = self.snapshot_path(&schema.name, schema.version);
        if path.exists() {
            return Err(self.version_exists(schema));
        }

        let json = schema.to_json()?;

        // Publish without replacing; a writer that lost the race gets VersionExists
        let mut tmp = tempfile::Builder::new()
            .prefix(".snapshot")
            .suffix(".tmp")
            .tempfile_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path).map_err(|e| match e.error.kind() {
            ErrorKind::AlreadyExists => self.version_exists(schema),
            _ => RegistryError::Io(e.error),
        })?;

        tracing::debug!(
            schema = %schema.name,
            version = schema.version,
            path = %path.display(),
            "stored schema snapshot"
        );

        Ok(path)
    }

    /// Most recent snapshot, or `None` if the name was never recorded
    pub fn latest(&self, name: &str) -> Result<Option<Schema>> {
        validate_name(name)?;
        match self.versions(name)?.last() {
            Some(&version) => self.get(name, version).map(Some),
            None => Ok(None),
        }
    }

    /// Load a specific version
    pub fn get(&self, name: &str, version: u32) -> Result<Schema> {
        validate_name(name)?;
        let path = self.snapshot_path(name, version);
        if !path.is_file() {
            if !self.root.join(name).is_dir() {
                return Err(RegistryError::NotFound(name.to_string()));
            }
            return Err(RegistryError::VersionNotFound {
                name: name.to_string(),
                version,
            });
        }
        load(&path, name, version)
    }

    /// All recorded versions of `name`, ascending
    pub fn versions(&self, name: &str) -> Result<Vec<u32>> {
        validate_name(name)?;
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if let Some(caps) = SNAPSHOT_FILE.captures(&file_name) {
                match caps[1].parse::<u32>() {
                    Ok(version) => versions.push(version),
                    Err(_) => tracing::warn!(file = %entry.path().display(), "ignoring snapshot with unreadable version"),
                }
            }
        }

        versions.sort_unstable();
        Ok(versions)
    }

    /// Names with at least one snapshot, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_name(&name).is_ok() && !self.versions(&name)?.is_empty() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Metadata for every stored version of `name`, oldest first
    pub fn history(&self, name: &str) -> Result<Vec<SnapshotInfo>> {
        let versions = self.versions(name)?;
        if versions.is_empty() {
            return Err(RegistryError::NotFound(name.to_string()));
        }

        versions
            .into_iter()
            .map(|version| {
                let path = self.snapshot_path(name, version);
                let schema = load(&path, name, version)?;
                let fingerprint = schema.fingerprint()?;
                Ok(SnapshotInfo {
                    name: schema.name.clone(),
                    version,
                    captured_at: schema.captured_at,
                    top_level_columns: schema.top_level_columns().len(),
                    fingerprint,
                    path,
                })
            })
            .collect()
    }

    fn version_exists(&self, schema: &Schema) -> RegistryError {
        RegistryError::VersionExists {
            name: schema.name.clone(),
            version: schema.version,
        }
    }

    fn snapshot_path(&self, name: &str, version: u32) -> PathBuf {
        self.root.join(name).join(format!("v{}.json", version))
    }
}

fn load(path: &Path, name: &str, version: u32) -> Result<Schema> {
    let json = fs::read_to_string(path)?;
    let schema = Schema::from_json(&json).map_err(|e| RegistryError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if schema.name != name || schema.version != version {
        return Err(RegistryError::Corrupt {
            path: path.to_path_buf(),
            reason: format!(
                "file holds '{}' version {}, expected '{}' version {}",
                schema.name, schema.version, name, version
            ),
        });
    }

    Ok(schema)
}

fn walk_error(err: walkdir::Error) -> RegistryError {
    match err.into_io_error() {
        Some(io) => RegistryError::Io(io),
        None => RegistryError::Io(std::io::Error::other("filesystem loop in registry")),
    }
}
