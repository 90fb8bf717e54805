//! Typed component references and the builder that produces them.
//!
//! Each classified token becomes one [`ComponentReference`] carrying its
//! provenance-specific resolver. Tokens joined with `+` or `,` become
//! several references sharing one group tag; explicit group declarations
//! tie already-added references together. Per-token syntax failures are
//! collected, never silently dropped.

use std::fmt;
use std::sync::Arc;

use appforge_common::types::ImageRef;

use crate::error::GenerateError;
use crate::resolve::{ComponentMatch, ResolveError, Resolver};
use crate::source::{SourceId, SourceRegistry};

/// One user-supplied token representing a desired image or build target.
#[derive(Debug, Clone)]
pub struct ComponentReference {
    value: String,
    argument: String,
    resolver: Arc<dyn Resolver>,
    resolved: Option<ComponentMatch>,
    expect_to_build: bool,
    uses: Option<SourceId>,
    group: Option<String>,
}

impl ComponentReference {
    /// Creates an unresolved reference with its resolver attached.
    #[must_use]
    pub fn new(
        value: impl Into<String>,
        argument: impl Into<String>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        Self {
            value: value.into(),
            argument: argument.into(),
            resolver,
            resolved: None,
            expect_to_build: false,
            uses: None,
            group: None,
        }
    }

    /// The raw token this reference was built from.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The flag form this reference originated from, for diagnostics.
    #[must_use]
    pub fn argument(&self) -> &str {
        &self.argument
    }

    /// Resolves this reference through its attached resolver.
    ///
    /// A reference resolves at most once; calling again after success is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's not-found/ambiguous/lookup failure; the
    /// reference stays unresolved.
    pub fn resolve(&mut self) -> Result<(), ResolveError> {
        if self.resolved.is_some() {
            return Ok(());
        }
        self.resolved = Some(self.resolver.resolve(&self.value)?);
        Ok(())
    }

    /// The resolution result, once [`resolve`](Self::resolve) succeeded.
    #[must_use]
    pub fn resolved(&self) -> Option<&ComponentMatch> {
        self.resolved.as_ref()
    }

    /// Whether this reference expects to build source code.
    #[must_use]
    pub fn expect_to_build(&self) -> bool {
        self.expect_to_build
    }

    /// Marks whether this reference expects to build source code.
    pub fn set_expect_to_build(&mut self, expect: bool) {
        self.expect_to_build = expect;
    }

    /// The source repository this reference builds from, once associated.
    #[must_use]
    pub fn uses(&self) -> Option<SourceId> {
        self.uses
    }

    /// Associates this reference with a source repository.
    pub fn use_source(&mut self, source: SourceId) {
        self.uses = Some(source);
    }

    /// The user-declared group tag, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Tags this reference as part of a group.
    pub fn set_group(&mut self, group: impl Into<String>) {
        self.group = Some(group.into());
    }
}

impl fmt::Display for ComponentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Accumulates classified items into references and source repositories.
#[derive(Debug, Default)]
pub struct ReferenceBuilder {
    references: Vec<ComponentReference>,
    sources: SourceRegistry,
    errors: Vec<GenerateError>,
}

impl ReferenceBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a source-code repository.
    pub fn add_source_repository(&mut self, location: impl Into<String>) {
        let _ = self.sources.add(location);
    }

    /// Adds one reference per image token, splitting `+`/`,` joined
    /// tokens into a shared group.
    ///
    /// `wire` supplies the provenance-specific diagnostic argument and
    /// resolver for each part.
    pub fn add_images<F>(&mut self, tokens: &[String], wire: F)
    where
        F: Fn(&str) -> (String, Arc<dyn Resolver>),
    {
        for token in tokens {
            let parts: Vec<&str> = token.split(['+', ',']).collect();
            // A token either yields references for every part or one error.
            if let Some(err) = parts.iter().find_map(|part| ImageRef::parse(part).err()) {
                self.errors.push(GenerateError::ReferenceSyntax {
                    token: token.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
            let group = (parts.len() > 1).then(|| token.clone());
            for part in parts {
                let (argument, resolver) = wire(part);
                let mut reference = ComponentReference::new(part, argument, resolver);
                if let Some(tag) = &group {
                    reference.set_group(tag.clone());
                }
                self.references.push(reference);
            }
        }
    }

    /// Ties already-added references together under explicit group
    /// declarations of the form `name1+name2`.
    pub fn add_groups(&mut self, groups: &[String]) {
        for spec in groups {
            for part in spec.split(['+', ',']) {
                if part.is_empty() {
                    self.errors.push(GenerateError::ReferenceSyntax {
                        token: spec.clone(),
                        reason: "empty name in group declaration".into(),
                    });
                    continue;
                }
                let mut found = false;
                for reference in &mut self.references {
                    if reference.value() == part {
                        reference.set_group(spec.clone());
                        found = true;
                    }
                }
                if !found {
                    self.errors.push(GenerateError::ReferenceSyntax {
                        token: spec.clone(),
                        reason: format!("group names unknown component {part:?}"),
                    });
                }
            }
        }
    }

    /// Finishes the build, returning every reference and repository plus
    /// all collected syntax errors.
    #[must_use]
    pub fn result(self) -> (Vec<ComponentReference>, SourceRegistry, Vec<GenerateError>) {
        (self.references, self.sources, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{LookupResolver, TableLookup};

    fn empty_resolver() -> Arc<dyn Resolver> {
        Arc::new(LookupResolver::new("registry", Arc::new(TableLookup::default())))
    }

    fn wire(part: &str) -> (String, Arc<dyn Resolver>) {
        (format!("--image={part:?}"), empty_resolver())
    }

    #[test]
    fn add_images_one_reference_per_token() {
        let mut builder = ReferenceBuilder::new();
        builder.add_images(&["mysql".into(), "redhat/php:5".into()], wire);
        let (refs, _, errors) = builder.result();
        assert!(errors.is_empty());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].value(), "mysql");
        assert_eq!(refs[0].argument(), "--image=\"mysql\"");
        assert!(refs[0].group().is_none());
    }

    #[test]
    fn add_images_joined_token_shares_group() {
        let mut builder = ReferenceBuilder::new();
        builder.add_images(&["mysql+ruby".into()], wire);
        let (refs, _, errors) = builder.result();
        assert!(errors.is_empty());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].group(), Some("mysql+ruby"));
        assert_eq!(refs[1].group(), Some("mysql+ruby"));
    }

    #[test]
    fn add_images_malformed_token_yields_error_not_references() {
        let mut builder = ReferenceBuilder::new();
        builder.add_images(&["good+".into(), "fine".into()], wire);
        let (refs, _, errors) = builder.result();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].value(), "fine");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("good+"), "got: {}", errors[0]);
    }

    #[test]
    fn add_groups_ties_existing_references() {
        let mut builder = ReferenceBuilder::new();
        builder.add_images(&["mysql".into(), "ruby".into()], wire);
        builder.add_groups(&["mysql+ruby".into()]);
        let (refs, _, errors) = builder.result();
        assert!(errors.is_empty());
        assert_eq!(refs[0].group(), Some("mysql+ruby"));
        assert_eq!(refs[1].group(), Some("mysql+ruby"));
    }

    #[test]
    fn add_groups_unknown_name_is_error() {
        let mut builder = ReferenceBuilder::new();
        builder.add_images(&["mysql".into()], wire);
        builder.add_groups(&["mysql+ghost".into()]);
        let (_, _, errors) = builder.result();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("ghost"), "got: {}", errors[0]);
    }

    #[test]
    fn add_source_repository_registers_source() {
        let mut builder = ReferenceBuilder::new();
        builder.add_source_repository("./app");
        let (_, sources, _) = builder.result();
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn reference_resolves_at_most_once() {
        let lookup = TableLookup::new(vec![ComponentMatch {
            term: "nginx".into(),
            image: ImageRef::parse("nginx").expect("parse failed"),
            name: "nginx".into(),
            description: String::new(),
            builder: false,
            ports: Vec::new(),
        }]);
        let resolver: Arc<dyn Resolver> = Arc::new(LookupResolver::new("registry", Arc::new(lookup)));
        let mut reference = ComponentReference::new("nginx", "nginx", resolver);
        reference.resolve().expect("resolve failed");
        let first = reference.resolved().cloned();
        reference.resolve().expect("second resolve failed");
        assert_eq!(reference.resolved().cloned(), first);
    }
}
