//! Configuration store: descriptors grouped by configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use crate::models::descriptor::{Descriptor, RawDescriptor};
use crate::rules::normalize_text;

/// A descriptor file or entry that was skipped while loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// File path, or `path#descriptor` for a single descriptor.
    pub source: String,
    pub reason: String,
}

/// Outcome of loading a descriptor directory.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Files that were read and decoded.
    pub files: Vec<PathBuf>,
    /// Descriptors compiled successfully.
    pub loaded: usize,
    /// Files and descriptors that were skipped.
    pub rejected: Vec<Rejection>,
}

/// In-memory set of descriptors: group name -> descriptor name -> descriptor.
#[derive(Debug, Clone, Default)]
pub struct DescriptorStore {
    groups: BTreeMap<String, BTreeMap<String, Descriptor>>,
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.{extension}` file under `dir`, recursively. The group
    /// of a file is its path relative to `dir` without the extension, so
    /// `bnp.json` is `bnp` and `crowd/lendix.json` is `crowd/lendix`.
    ///
    /// Unreadable or malformed files are reported and skipped. Only a
    /// directory that cannot be enumerated at all is an error.
    pub fn load_dir(dir: &Path, extension: &str) -> Result<(Self, LoadReport)> {
        let enumerate_err = |reason: String| ConfigError::Enumerate {
            path: dir.display().to_string(),
            reason,
        };
        if !dir.is_dir() {
            return Err(enumerate_err("not a directory".into()).into());
        }

        let pattern = dir.join("**").join(format!("*.{}", extension));
        let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| enumerate_err(e.to_string()))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Cannot access {}: {}", e.path().display(), e);
                    None
                }
            })
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut store = Self::new();
        let mut report = LoadReport::default();

        for path in paths {
            let group = group_name(dir, &path);

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping descriptor file {}: {}", path.display(), e);
                    report.rejected.push(Rejection {
                        source: path.display().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match store.insert_json(&group, &content, &path.display().to_string(), &mut report) {
                Ok(count) => {
                    debug!("Loaded {} descriptors from {}", count, path.display());
                    report.files.push(path);
                }
                Err(e) => {
                    warn!("Skipping descriptor file {}: {}", path.display(), e);
                    report.rejected.push(Rejection {
                        source: path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok((store, report))
    }

    /// Decode a descriptor file and add its descriptors under `group`.
    ///
    /// A file that is not a JSON object of objects fails as a whole;
    /// individual descriptors that fail to compile are added to
    /// `report.rejected` and their siblings are kept.
    pub fn insert_json(
        &mut self,
        group: &str,
        content: &str,
        source: &str,
        report: &mut LoadReport,
    ) -> std::result::Result<usize, ConfigError> {
        let parse_err = |reason: String| ConfigError::Parse {
            path: source.to_string(),
            reason,
        };
        let entries: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&normalize_text(content)).map_err(|e| parse_err(e.to_string()))?;

        let mut count = 0;
        for (name, value) in entries {
            let compiled = serde_json::from_value::<RawDescriptor>(value)
                .map_err(|e| parse_err(e.to_string()))
                .and_then(|raw| Descriptor::compile(group, name.as_str(), raw));
            match compiled {
                Ok(descriptor) => {
                    self.insert(descriptor);
                    count += 1;
                }
                Err(e) => {
                    warn!("Rejected descriptor {}#{}: {}", source, name, e);
                    report.rejected.push(Rejection {
                        source: format!("{}#{}", source, name),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.loaded += count;
        Ok(count)
    }

    /// Add (or replace) a compiled descriptor.
    pub fn insert(&mut self, descriptor: Descriptor) {
        self.groups
            .entry(descriptor.group.clone())
            .or_default()
            .insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, group: &str, name: &str) -> Option<&Descriptor> {
        self.groups.get(group)?.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// All descriptors, ordered by group then name.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.groups.values().flat_map(|group| group.values())
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn group_name(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BNP: &str = r#"{
        "Checking": {
            "bank-name": "BNP",
            "bank-pattern": "BNP PARIBAS",
            "balance-pattern": "SOLDE ([\\d ]+),(\\d{2})",
            "date-pattern": "AU (\\d\\d)\\.(\\d\\d)\\.(\\d{4})"
        },
        "Broken": {
            "bank-name": "BNP",
            "balance-pattern": "SOLDE (\\d+"
        }
    }"#;

    #[test]
    fn test_insert_json_keeps_valid_siblings() {
        let mut store = DescriptorStore::new();
        let mut report = LoadReport::default();
        let count = store.insert_json("bnp", BNP, "bnp.json", &mut report).unwrap();

        assert_eq!(count, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("bnp", "Checking").is_some());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].source, "bnp.json#Broken");
    }

    #[test]
    fn test_insert_json_rejects_malformed_file() {
        let mut store = DescriptorStore::new();
        let mut report = LoadReport::default();
        let err = store
            .insert_json("bad", "{ not json", "bad.json", &mut report)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_dir_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bnp.json"), BNP).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested").join("lcl.json"),
            r#"{"Savings": {"bank-name": "LCL", "bank-pattern": "LCL"}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "[1, 2").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (store, report) = DescriptorStore::load_dir(dir.path(), "json").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.groups().collect::<Vec<_>>(), vec!["bnp", "nested/lcl"]);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.rejected.len(), 2);
    }

    #[test]
    fn test_same_file_name_in_two_folders() {
        let dir = tempfile::tempdir().unwrap();
        for bank in ["bnp", "lcl"] {
            fs::create_dir(dir.path().join(bank)).unwrap();
            fs::write(
                dir.path().join(bank).join("checking.json"),
                format!(r#"{{"Checking": {{"bank-name": "{bank}", "bank-pattern": "{bank}"}}}}"#),
            )
            .unwrap();
        }

        let (store, report) = DescriptorStore::load_dir(dir.path(), "json").unwrap();

        assert_eq!(store.len(), 2);
        assert!(report.rejected.is_empty());
        assert_eq!(store.get("bnp/checking", "Checking").unwrap().bank_name, "bnp");
        assert_eq!(store.get("lcl/checking", "Checking").unwrap().bank_name, "lcl");
    }

    #[test]
    fn test_load_dir_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(DescriptorStore::load_dir(&missing, "json").is_err());
    }
}
