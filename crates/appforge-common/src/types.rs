//! Domain primitive types used across the appforge workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ImageRefError;

/// A parsed container image identity: `[registry/][namespace/]name[:tag]`.
///
/// The parse is intentionally permissive about what a name looks like and
/// strict about shape: no empty segments, no whitespace, at most one tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    /// Registry host, when the first path segment looks like one.
    pub registry: Option<String>,
    /// Namespace (user or organization) segment, when present.
    pub namespace: Option<String>,
    /// Repository name. Never empty.
    pub name: String,
    /// Tag, when present.
    pub tag: Option<String>,
}

impl ImageRef {
    /// Parses an image reference string.
    ///
    /// The first segment is treated as a registry host when it contains a
    /// `.` or `:` or equals `localhost`, matching the conventional
    /// reference grammar.
    ///
    /// # Errors
    ///
    /// Returns [`ImageRefError`] when the input is empty, contains
    /// whitespace, or has empty segments.
    pub fn parse(value: &str) -> Result<Self, ImageRefError> {
        let fail = |reason: &str| ImageRefError {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(fail("empty reference"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(fail("must not contain whitespace"));
        }

        let (repo, tag) = match value.rsplit_once(':') {
            // A ':' before the last '/' belongs to a registry port.
            Some((head, after)) if !after.contains('/') => {
                if after.is_empty() {
                    return Err(fail("empty tag"));
                }
                (head, Some(after.to_string()))
            }
            _ => (value, None),
        };

        let segments: Vec<&str> = repo.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(fail("empty path segment"));
        }

        let (registry, rest) = match segments.first() {
            Some(first)
                if segments.len() > 1
                    && (first.contains('.') || first.contains(':') || *first == "localhost") =>
            {
                (Some((*first).to_string()), &segments[1..])
            }
            _ => (None, &segments[..]),
        };

        let (namespace, name) = match rest {
            [name] => (None, (*name).to_string()),
            [namespace, name] => (Some((*namespace).to_string()), (*name).to_string()),
            _ => return Err(fail("too many path segments")),
        };

        Ok(Self {
            registry,
            namespace,
            name,
            tag,
        })
    }

    /// Suggests an object name derived from this reference.
    ///
    /// Tags and registry/namespace prefixes make poor object names, so
    /// only the repository name is used.
    #[must_use]
    pub fn suggest_name(&self) -> &str {
        &self.name
    }

    /// Returns a copy of this reference with the given tag.
    #[must_use]
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..self.clone()
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}/")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_name() {
        let image = ImageRef::parse("mysql").expect("parse failed");
        assert_eq!(image.name, "mysql");
        assert!(image.registry.is_none());
        assert!(image.namespace.is_none());
        assert!(image.tag.is_none());
    }

    #[test]
    fn parse_namespace_name_tag() {
        let image = ImageRef::parse("redhat/mysql:5.6").expect("parse failed");
        assert_eq!(image.namespace.as_deref(), Some("redhat"));
        assert_eq!(image.name, "mysql");
        assert_eq!(image.tag.as_deref(), Some("5.6"));
    }

    #[test]
    fn parse_registry_with_port() {
        let image = ImageRef::parse("registry.local:5000/team/app:v1").expect("parse failed");
        assert_eq!(image.registry.as_deref(), Some("registry.local:5000"));
        assert_eq!(image.namespace.as_deref(), Some("team"));
        assert_eq!(image.name, "app");
        assert_eq!(image.tag.as_deref(), Some("v1"));
    }

    #[test]
    fn parse_localhost_registry() {
        let image = ImageRef::parse("localhost/app").expect("parse failed");
        assert_eq!(image.registry.as_deref(), Some("localhost"));
        assert_eq!(image.name, "app");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(ImageRef::parse("").is_err());
    }

    #[test]
    fn parse_rejects_whitespace() {
        assert!(ImageRef::parse("my sql").is_err());
    }

    #[test]
    fn parse_rejects_empty_tag() {
        assert!(ImageRef::parse("mysql:").is_err());
    }

    #[test]
    fn parse_rejects_empty_segment() {
        assert!(ImageRef::parse("redhat//mysql").is_err());
    }

    #[test]
    fn display_roundtrips_canonical_form() {
        for input in ["mysql", "redhat/mysql:5.6", "registry.local:5000/team/app:v1"] {
            let image = ImageRef::parse(input).expect("parse failed");
            assert_eq!(image.to_string(), input);
        }
    }

    #[test]
    fn suggest_name_strips_prefix_and_tag() {
        let image = ImageRef::parse("redhat/php:5").expect("parse failed");
        assert_eq!(image.suggest_name(), "php");
    }

    #[test]
    fn with_tag_replaces_tag() {
        let image = ImageRef::parse("redhat/php:5").expect("parse failed");
        assert_eq!(image.with_tag("latest").to_string(), "redhat/php:latest");
    }
}
