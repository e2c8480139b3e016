//! Zone data validation utilities.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cellguard_core::data::ZoneData;
use cellguard_core::error::{GameError, Result};

/// Validation outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// Zone id, if the file parsed.
    pub zone_id: Option<String>,
    /// Problems found; empty when the file is valid.
    pub problems: Vec<String>,
}

/// Validation outcome for a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// One entry per `.ron` file, sorted by path.
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    /// Whether every file parsed and passed validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.files.iter().all(|f| f.problems.is_empty())
    }

    /// Total number of problems.
    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.files.iter().map(|f| f.problems.len()).sum()
    }
}

/// Validate one zone file's text.
#[must_use]
pub fn validate_zone_text(path: &Path, text: &str) -> FileReport {
    let source_name = path.display().to_string();
    match ZoneData::from_ron_str(&source_name, text) {
        Ok(zone) => {
            let mut problems = zone.validate();
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem != zone.id {
                    problems.push(format!("File name '{stem}' does not match zone id '{}'", zone.id));
                }
            }
            FileReport {
                path: path.to_path_buf(),
                zone_id: Some(zone.id),
                problems,
            }
        }
        Err(GameError::DataParseError { message, .. }) => FileReport {
            path: path.to_path_buf(),
            zone_id: None,
            problems: vec![format!("Parse error: {message}")],
        },
        Err(other) => FileReport {
            path: path.to_path_buf(),
            zone_id: None,
            problems: vec![other.to_string()],
        },
    }
}

/// Validate all zone RON files in a directory.
///
/// Besides per-zone checks this flags zone ids used by more than one file.
///
/// # Errors
///
/// Returns an error if the directory or a file cannot be read.
pub fn validate_zone_directory(path: &Path) -> Result<ValidationReport> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(path)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for file in paths {
        let text = std::fs::read_to_string(&file)?;
        files.push(validate_zone_text(&file, &text));
    }

    let mut owners: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, file) in files.iter().enumerate() {
        if let Some(id) = &file.zone_id {
            owners.entry(id.clone()).or_default().push(index);
        }
    }
    for (id, indices) in owners {
        if indices.len() > 1 {
            for index in indices {
                files[index].problems.push(format!("Zone id '{id}' is used by more than one file"));
            }
        }
    }

    Ok(ValidationReport { files })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: &str = r#"ZoneData(
        id: "ZONE_ID",
        display_name: "zone.test.name",
        enemies: [
            EnemySpec(
                id: "virus",
                display_name: "enemy.virus.name",
                stats: StatBlock(health: 10, attack_power: 4),
                behavior: Chase,
                speed: 40.0,
                spawn_weight: 1.0,
                points: 5,
            ),
        ],
    )"#;

    fn write(dir: &Path, file: &str, id: &str) {
        std::fs::write(dir.join(file), ZONE.replace("ZONE_ID", id)).unwrap();
    }

    #[test]
    fn test_valid_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "alpha.ron", "alpha");
        write(dir.path(), "beta.ron", "beta");

        let report = validate_zone_directory(dir.path()).unwrap();
        assert_eq!(report.files.len(), 2);
        assert!(report.is_valid());
    }

    #[test]
    fn test_duplicate_ids_and_name_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "alpha.ron", "alpha");
        write(dir.path(), "copy.ron", "alpha");

        let report = validate_zone_directory(dir.path()).unwrap();
        assert!(!report.is_valid());
        // copy.ron: name mismatch + duplicate; alpha.ron: duplicate.
        assert_eq!(report.problem_count(), 3);
    }

    #[test]
    fn test_parse_error_reported() {
        let report = validate_zone_text(Path::new("broken.ron"), "ZoneData(id: ");
        assert!(report.zone_id.is_none());
        assert!(report.problems[0].starts_with("Parse error"));
    }

    #[test]
    fn test_semantic_problems_reported() {
        let text = ZONE.replace("ZONE_ID", "bad").replace("health: 10", "health: 0");
        let report = validate_zone_text(Path::new("bad.ron"), &text);
        assert_eq!(report.zone_id.as_deref(), Some("bad"));
        assert_eq!(report.problems.len(), 1);
    }

    #[test]
    fn test_shipped_zones_are_valid() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/zones");
        let report = validate_zone_directory(&root).unwrap();
        assert!(report.files.len() >= 2);
        assert!(report.is_valid(), "{:?}", report.files);
    }

    #[test]
    fn test_missing_directory_is_error() {
        assert!(validate_zone_directory(Path::new("/no/such/zone/dir")).is_err());
    }
}
