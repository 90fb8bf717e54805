//! Source repositories and their registry.
//!
//! Repositories and component references point at each other ("uses" /
//! "used by"), so repositories live in an arena addressed by [`SourceId`]
//! and back-references are stored as indices, never as owning links.

use std::path::{Path, PathBuf};

use crate::error::GenerateError;

/// Handle into a [`SourceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

/// A user-declared source-code location.
#[derive(Debug, Clone)]
pub struct SourceRepository {
    location: String,
    local_path: Option<PathBuf>,
    used_by: Vec<usize>,
    build_with_docker: bool,
}

impl SourceRepository {
    fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            local_path: None,
            used_by: Vec::new(),
            build_with_docker: false,
        }
    }

    /// The location exactly as the user supplied it.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether at least one component reference declared use of this
    /// repository.
    #[must_use]
    pub fn in_use(&self) -> bool {
        !self.used_by.is_empty()
    }

    /// Indices of the component references using this repository.
    #[must_use]
    pub fn used_by(&self) -> &[usize] {
        &self.used_by
    }

    /// Records that the reference at `reference_index` uses this
    /// repository.
    pub fn record_use(&mut self, reference_index: usize) {
        self.used_by.push(reference_index);
    }

    /// Marks this repository as built from its own Dockerfile.
    pub fn build_with_docker(&mut self) {
        self.build_with_docker = true;
    }

    /// Whether the repository builds from its own Dockerfile.
    #[must_use]
    pub fn is_docker_build(&self) -> bool {
        self.build_with_docker
    }

    /// Resolves and caches the local filesystem path for this repository.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::LocalPath`] for remote locations (cloning
    /// is an external concern) and for paths that do not name a readable
    /// directory.
    pub fn local_path(&mut self) -> Result<&Path, GenerateError> {
        let path = match self.local_path.take() {
            Some(path) => path,
            None => resolve_local_path(&self.location)?,
        };
        Ok(self.local_path.insert(path))
    }
}

fn resolve_local_path(location: &str) -> Result<PathBuf, GenerateError> {
    const REMOTE_SCHEMES: [&str; 4] = ["http://", "https://", "git://", "ssh://"];
    if REMOTE_SCHEMES.iter().any(|s| location.starts_with(s)) || location.starts_with("git@") {
        return Err(GenerateError::LocalPath {
            location: location.to_string(),
            reason: "remote repositories must be available locally before detection".into(),
        });
    }
    let path = Path::new(location);
    if !path.is_dir() {
        return Err(GenerateError::LocalPath {
            location: location.to_string(),
            reason: "not a directory".into(),
        });
    }
    path.canonicalize().map_err(|err| GenerateError::LocalPath {
        location: location.to_string(),
        reason: err.to_string(),
    })
}

/// Arena of source repositories for one run.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    repositories: Vec<SourceRepository>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a repository and returns its handle.
    pub fn add(&mut self, location: impl Into<String>) -> SourceId {
        self.repositories.push(SourceRepository::new(location));
        SourceId(self.repositories.len() - 1)
    }

    /// Returns the repository for `id`.
    #[must_use]
    pub fn get(&self, id: SourceId) -> Option<&SourceRepository> {
        self.repositories.get(id.0)
    }

    /// Returns the repository for `id`, mutably.
    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut SourceRepository> {
        self.repositories.get_mut(id.0)
    }

    /// Iterates over `(id, repository)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &SourceRepository)> {
        self.repositories
            .iter()
            .enumerate()
            .map(|(index, repo)| (SourceId(index), repo))
    }

    /// All handles in declaration order.
    #[must_use]
    pub fn ids(&self) -> Vec<SourceId> {
        (0..self.repositories.len()).map(SourceId).collect()
    }

    /// Number of declared repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    /// Whether no repositories were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_add_and_get_roundtrip() {
        let mut registry = SourceRegistry::new();
        let id = registry.add("./app");
        assert_eq!(registry.get(id).expect("missing").location(), "./app");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repository_in_use_iff_recorded() {
        let mut registry = SourceRegistry::new();
        let id = registry.add("./app");
        assert!(!registry.get(id).expect("missing").in_use());
        registry.get_mut(id).expect("missing").record_use(3);
        let repo = registry.get(id).expect("missing");
        assert!(repo.in_use());
        assert_eq!(repo.used_by(), &[3]);
    }

    #[test]
    fn local_path_resolves_existing_directory() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let mut registry = SourceRegistry::new();
        let id = registry.add(dir.path().to_string_lossy().into_owned());
        let repo = registry.get_mut(id).expect("missing");
        let path = repo.local_path().expect("local path failed");
        assert!(path.is_dir());
    }

    #[test]
    fn local_path_rejects_remote_location() {
        let mut registry = SourceRegistry::new();
        let id = registry.add("https://example.com/app.git");
        let err = registry
            .get_mut(id)
            .expect("missing")
            .local_path()
            .unwrap_err();
        assert!(err.to_string().contains("example.com"), "got: {err}");
    }

    #[test]
    fn local_path_rejects_missing_directory() {
        let mut registry = SourceRegistry::new();
        let id = registry.add("/nonexistent/definitely/missing");
        assert!(registry.get_mut(id).expect("missing").local_path().is_err());
    }

    #[test]
    fn docker_build_flag_starts_false() {
        let mut registry = SourceRegistry::new();
        let id = registry.add("./app");
        assert!(!registry.get(id).expect("missing").is_docker_build());
        registry.get_mut(id).expect("missing").build_with_docker();
        assert!(registry.get(id).expect("missing").is_docker_build());
    }
}
