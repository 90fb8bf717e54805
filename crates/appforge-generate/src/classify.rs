//! Argument classification.
//!
//! Buckets raw input tokens into environment assignments, source-code
//! locations, component references, and unknowns. Tokens are tested in
//! priority order; empty tokens are dropped silently; unknowns are
//! returned to the caller rather than treated as an error.

use std::path::Path;

use appforge_common::types::ImageRef;

use crate::env::is_environment_argument;

/// The four ordered buckets produced by classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    /// `KEY=VALUE` environment assignments.
    pub environment: Vec<String>,
    /// Tokens that look like source-code locations.
    pub sources: Vec<String>,
    /// Tokens that look like component references.
    pub components: Vec<String>,
    /// Everything else, returned to the caller.
    pub unknown: Vec<String>,
}

/// Classifies `args` into [`Buckets`], preserving input order per bucket.
#[must_use]
pub fn classify_arguments<S: AsRef<str>>(args: &[S]) -> Buckets {
    let mut buckets = Buckets::default();
    for arg in args {
        let token = arg.as_ref();
        if token.is_empty() {
            continue;
        }
        if is_environment_argument(token) {
            buckets.environment.push(token.to_string());
        } else if is_possible_source_repository(token) {
            buckets.sources.push(token.to_string());
        } else if is_component_reference(token) {
            buckets.components.push(token.to_string());
        } else {
            buckets.unknown.push(token.to_string());
        }
    }
    buckets
}

/// Whether `token` looks like a source-code location: a git-style URL, a
/// `.git` suffix, an explicit filesystem path form, or an existing local
/// directory.
#[must_use]
pub fn is_possible_source_repository(token: &str) -> bool {
    const SCHEMES: [&str; 4] = ["http://", "https://", "git://", "ssh://"];
    if SCHEMES.iter().any(|scheme| token.starts_with(scheme)) {
        return true;
    }
    if token.starts_with("git@") || token.ends_with(".git") {
        return true;
    }
    if token == "."
        || token.starts_with('/')
        || token.starts_with("./")
        || token.starts_with("../")
        || token.starts_with("~/")
    {
        return true;
    }
    Path::new(token).is_dir()
}

/// Whether `token` looks like a component reference: one or more image
/// reference parts joined by `+` or `,` into a logical group.
#[must_use]
pub fn is_component_reference(token: &str) -> bool {
    !token.is_empty()
        && token
            .split(['+', ','])
            .all(|part| ImageRef::parse(part).is_ok())
}
