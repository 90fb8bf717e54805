//! File-backed image catalog lookups.
//!
//! Each resolver provenance (image streams, registry snapshot, local
//! images) is served by a JSON catalog file in the data directory, so the
//! tool works fully offline. A missing catalog behaves as an empty one.

use std::path::{Path, PathBuf};

use appforge_common::types::ImageRef;
use appforge_generate::{ComponentMatch, ImageLookup, ImageSearcher};
use serde::{Deserialize, Serialize};

/// Entry in an image catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Primary lookup name.
    pub name: String,
    /// Additional names this entry answers to.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// The concrete image reference.
    pub image: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Whether the image can build source on top of itself.
    #[serde(default)]
    pub builder: bool,
    /// Ports the image exposes.
    #[serde(default)]
    pub ports: Vec<u16>,
}

/// Image lookup backed by a JSON catalog file.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    catalog_path: PathBuf,
}

impl FileCatalog {
    /// Opens a catalog at the given file path. The file is read on every
    /// lookup; it does not need to exist yet.
    #[must_use]
    pub fn open(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
        }
    }

    /// Lists all entries in the catalog. A missing file is an empty
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be read or parsed.
    pub fn list(&self) -> Result<Vec<CatalogEntry>, String> {
        if !self.catalog_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.catalog_path)
            .map_err(|e| format!("reading {}: {e}", self.catalog_path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("parsing {}: {e}", self.catalog_path.display()))
    }

    /// Returns the path this catalog reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.catalog_path
    }

    fn matches(entry: &CatalogEntry, needle: &str) -> bool {
        entry.name.eq_ignore_ascii_case(needle)
            || entry.image == needle
            || entry.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle))
    }

    fn to_match(entry: &CatalogEntry, term: &str) -> Result<ComponentMatch, String> {
        let image = ImageRef::parse(&entry.image).map_err(|e| {
            format!("catalog entry {:?} has invalid image {:?}: {e}", entry.name, entry.image)
        })?;
        Ok(ComponentMatch {
            term: term.to_string(),
            image,
            name: entry.name.clone(),
            description: entry.description.clone(),
            builder: entry.builder,
            ports: entry.ports.clone(),
        })
    }
}

impl ImageLookup for FileCatalog {
    fn find(&self, term: &str) -> Result<Vec<ComponentMatch>, String> {
        self.list()?
            .iter()
            .filter(|entry| Self::matches(entry, term))
            .map(|entry| Self::to_match(entry, term))
            .collect()
    }
}

impl ImageSearcher for FileCatalog {
    fn search(&self, terms: &[String]) -> Result<Vec<ComponentMatch>, String> {
        for term in terms {
            let found = self.find(term)?;
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_catalog(dir: &Path, entries: &str) -> FileCatalog {
        let path = dir.join("catalog.json");
        std::fs::write(&path, entries).expect("write catalog");
        FileCatalog::open(path)
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let catalog = FileCatalog::open(dir.path().join("absent.json"));
        assert!(catalog.find("ruby").expect("find failed").is_empty());
    }

    #[test]
    fn find_matches_name_case_insensitively() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let catalog = write_catalog(
            dir.path(),
            r#"[{"name": "Ruby", "image": "redhat/ruby:2", "builder": true}]"#,
        );
        let found = catalog.find("ruby").expect("find failed");
        assert_eq!(found.len(), 1);
        assert!(found[0].builder);
        assert_eq!(found[0].image.to_string(), "redhat/ruby:2");
    }

    #[test]
    fn find_matches_aliases() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let catalog = write_catalog(
            dir.path(),
            r#"[{"name": "nodejs", "aliases": ["node", "js"], "image": "acme/node:20"}]"#,
        );
        assert_eq!(catalog.find("node").expect("find failed").len(), 1);
        assert_eq!(catalog.find("js").expect("find failed").len(), 1);
        assert!(catalog.find("python").expect("find failed").is_empty());
    }

    #[test]
    fn malformed_catalog_is_a_lookup_error() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let catalog = write_catalog(dir.path(), "not json");
        let err = catalog.find("ruby").unwrap_err();
        assert!(err.contains("parsing"), "got: {err}");
    }

    #[test]
    fn search_takes_first_term_with_matches() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let catalog = write_catalog(
            dir.path(),
            r#"[{"name": "python", "image": "acme/python:3"}]"#,
        );
        let found = catalog
            .search(&["cobol".into(), "python".into()])
            .expect("search failed");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].term, "python");
    }
}
