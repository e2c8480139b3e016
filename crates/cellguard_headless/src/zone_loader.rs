//! Zone data loading for headless runs.
//!
//! Zones are RON files (see `assets/zones/`). They can be referenced by
//! path or by bare name, which is resolved against the zone directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cellguard_core::data::ZoneData;
use cellguard_core::error::GameError;
use thiserror::Error;

/// Environment variable overriding the zone directory.
pub const ZONE_DIR_ENV: &str = "CELLGUARD_ZONE_DIR";

/// Errors that can occur during zone loading.
#[derive(Error, Debug)]
pub enum ZoneLoadError {
    /// Failed to read a file or directory.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file parsed badly or failed validation.
    #[error("{0}")]
    Data(#[from] GameError),
    /// Zone directory missing.
    #[error("Zone directory not found: {0}")]
    DirectoryNotFound(String),
    /// Bare zone name not present in the zone directory.
    #[error("Unknown zone '{0}'")]
    UnknownZone(String),
}

fn io_error(path: &Path, source: std::io::Error) -> ZoneLoadError {
    ZoneLoadError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Loaded zones keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: BTreeMap<String, ZoneData>,
}

impl ZoneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate one zone file. Returns its id.
    pub fn load_from_file(&mut self, path: &Path) -> Result<String, ZoneLoadError> {
        let zone = read_zone_file(path)?;
        let id = zone.id.clone();
        self.zones.insert(id.clone(), zone);
        Ok(id)
    }

    /// Load every `.ron` file in `dir`, skipping (and logging) broken ones.
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<Vec<String>, ZoneLoadError> {
        if !dir.is_dir() {
            return Err(ZoneLoadError::DirectoryNotFound(dir.display().to_string()));
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| io_error(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        paths.sort();

        let mut loaded = Vec::new();
        for path in paths {
            match self.load_from_file(&path) {
                Ok(id) => loaded.push(id),
                Err(e) => tracing::warn!("Failed to load zone from {:?}: {}", path, e),
            }
        }
        Ok(loaded)
    }

    /// Zone by id.
    pub fn get(&self, id: &str) -> Option<&ZoneData> {
        self.zones.get(id)
    }

    /// Loaded zone ids in sorted order.
    pub fn zone_ids(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    /// Number of loaded zones.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }
}

/// Read and strictly validate a zone file.
pub fn read_zone_file(path: &Path) -> Result<ZoneData, ZoneLoadError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let source_name = path.display().to_string();
    Ok(ZoneData::from_ron_str_strict(&source_name, &text)?)
}

/// Resolve the default zone directory.
///
/// Looks in order at:
/// 1. The `CELLGUARD_ZONE_DIR` environment variable
/// 2. `./assets/zones` (repo root)
/// 3. `../../assets/zones` (running from a crate directory)
pub fn default_zone_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(ZONE_DIR_ENV) {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Some(path);
        }
    }

    ["assets/zones", "../../assets/zones"]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_dir())
}

/// Load a zone given either a path to a `.ron` file or a bare zone name.
///
/// Bare names resolve to `<zone_dir>/<name>.ron`, where `zone_dir` is
/// `zone_dir` if given, else [`default_zone_dir`].
pub fn load_zone(name_or_path: &str, zone_dir: Option<&Path>) -> Result<ZoneData, ZoneLoadError> {
    let direct = Path::new(name_or_path);
    if direct.is_file() {
        return read_zone_file(direct);
    }

    let dir = match zone_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_zone_dir().ok_or_else(|| ZoneLoadError::DirectoryNotFound("zone directory".to_string()))?,
    };
    let candidate = dir.join(format!("{name_or_path}.ron"));
    if !candidate.is_file() {
        return Err(ZoneLoadError::UnknownZone(name_or_path.to_string()));
    }
    read_zone_file(&candidate)
}
