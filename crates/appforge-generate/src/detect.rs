//! Source-type detection and builder-image search collaborators.
//!
//! Both seams are traits: the engine only needs `detect` to say whether a
//! Dockerfile is present and which search terms the source tree suggests,
//! and `search` to propose builder images for those terms. Collaborator
//! failures are plain messages; the orchestrator attaches the offending
//! repository location.

use std::path::Path;

use appforge_common::types::ImageRef;

use crate::resolve::{ComponentMatch, ImageLookup};

/// What a detector learned about one source tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    /// Whether the tree carries its own Dockerfile.
    pub dockerfile: bool,
    /// Ordered search terms derived from detected signals.
    pub terms: Vec<String>,
}

/// Inspects a local source tree for build signals.
pub trait SourceDetector: std::fmt::Debug + Send + Sync {
    /// Detects the source type at `path`.
    ///
    /// # Errors
    ///
    /// Returns a message when the tree cannot be inspected.
    fn detect(&self, path: &Path) -> Result<SourceInfo, String>;
}

/// Suggests builder images for a set of search terms.
pub trait ImageSearcher: std::fmt::Debug + Send + Sync {
    /// Returns candidate matches for `terms`, possibly none.
    ///
    /// Term matching is case-insensitive; one term may yield several
    /// candidates.
    ///
    /// # Errors
    ///
    /// Returns a message when the search itself fails.
    fn search(&self, terms: &[String]) -> Result<Vec<ComponentMatch>, String>;
}

/// Detector driven by well-known signal files.
///
/// `Dockerfile` wins outright; otherwise each recognized file contributes
/// one search term, in table order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalFileDetector;

const SIGNAL_FILES: [(&str, &str); 8] = [
    ("Gemfile", "ruby"),
    ("Rakefile", "ruby"),
    ("package.json", "nodejs"),
    ("composer.json", "php"),
    ("index.php", "php"),
    ("requirements.txt", "python"),
    ("pom.xml", "jee"),
    ("Cargo.toml", "rust"),
];

impl SourceDetector for SignalFileDetector {
    fn detect(&self, path: &Path) -> Result<SourceInfo, String> {
        if !path.is_dir() {
            return Err(format!("{} is not a directory", path.display()));
        }
        if path.join("Dockerfile").is_file() {
            return Ok(SourceInfo {
                dockerfile: true,
                terms: Vec::new(),
            });
        }
        let mut terms: Vec<String> = Vec::new();
        for (file, term) in SIGNAL_FILES {
            if path.join(file).is_file() && !terms.iter().any(|t| t == term) {
                terms.push(term.to_string());
            }
        }
        Ok(SourceInfo {
            dockerfile: false,
            terms,
        })
    }
}

/// The reference static builder-image table.
///
/// Demonstrates the required search semantics: case-insensitive terms, and
/// one term may yield several candidates (a generic database name matches
/// both the exact vendor image and a generic community image).
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSearcher;

impl StaticSearcher {
    fn matches_for(term: &str) -> Vec<ComponentMatch> {
        let entry = |image: &str, name: &str, description: &str, builder: bool, ports: &[u16]| {
            ComponentMatch {
                term: term.to_string(),
                // The table only holds well-formed references.
                image: ImageRef::parse(image).unwrap_or(ImageRef {
                    registry: None,
                    namespace: None,
                    name: image.to_string(),
                    tag: None,
                }),
                name: name.to_string(),
                description: description.to_string(),
                builder,
                ports: ports.to_vec(),
            }
        };
        match term {
            "redhat/mysql:5.6" => vec![entry(
                "redhat/mysql:5.6",
                "MySQL 5.6",
                "The Open Source SQL database",
                false,
                &[3306],
            )],
            "mysql" | "mysql5" | "mysql-5" | "mysql-5.x" => vec![
                entry(
                    "redhat/mysql:5.6",
                    "MySQL 5.6",
                    "The Open Source SQL database",
                    false,
                    &[3306],
                ),
                entry(
                    "mysql",
                    "MySQL 5.X",
                    "Something out there on the Docker Hub.",
                    false,
                    &[3306],
                ),
            ],
            "php" | "php-5" | "php5" | "redhat/php:5" | "redhat/php-5" => vec![entry(
                "redhat/php:5",
                "PHP 5.5",
                "A fast and easy to use scripting language for building websites.",
                true,
                &[8080],
            )],
            "ruby" => vec![entry(
                "redhat/ruby:2",
                "Ruby 2.0",
                "A fast and easy to use scripting language for building websites.",
                true,
                &[8080],
            )],
            _ => Vec::new(),
        }
    }
}

impl ImageSearcher for StaticSearcher {
    fn search(&self, terms: &[String]) -> Result<Vec<ComponentMatch>, String> {
        for term in terms {
            let found = Self::matches_for(&term.to_lowercase());
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }
}

/// The static table also serves as a name lookup, so test and offline
/// wirings can resolve component references against it.
impl ImageLookup for StaticSearcher {
    fn find(&self, term: &str) -> Result<Vec<ComponentMatch>, String> {
        self.search(&[term.to_string()])
    }
}
