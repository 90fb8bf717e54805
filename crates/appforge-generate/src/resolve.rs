//! Multi-strategy name resolution.
//!
//! A [`Resolver`] turns a user-supplied name into exactly one
//! [`ComponentMatch`] or fails with not-found/ambiguous. Resolvers compose
//! through [`FirstMatchResolver`], an ordered combinator where the first
//! strategy yielding exactly one candidate wins.

use std::fmt;
use std::sync::Arc;

use appforge_common::types::ImageRef;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An immutable resolution result: one concrete image identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMatch {
    /// The search term that produced this match.
    pub term: String,
    /// The concrete image this match resolves to.
    pub image: ImageRef,
    /// Human-readable display name.
    pub name: String,
    /// Short description of what the image provides.
    pub description: String,
    /// Whether the image can build source code into a runnable image.
    pub builder: bool,
    /// Ports the image is known to expose.
    pub ports: Vec<u16>,
}

impl fmt::Display for ComponentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.image)
    }
}

/// A name failed to resolve to exactly one match.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No strategy produced any candidate.
    #[error("no images or image streams matched {value:?}")]
    NotFound {
        /// The name that was searched for.
        value: String,
    },

    /// More than one candidate matched and none was an exact single hit.
    #[error(
        "multiple images or image streams matched {value:?}: {}",
        candidates.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Ambiguous {
        /// The name that was searched for.
        value: String,
        /// Every candidate seen, in strategy order.
        candidates: Vec<ComponentMatch>,
    },

    /// The underlying lookup collaborator failed.
    #[error("{kind} lookup for {value:?} failed: {reason}")]
    Lookup {
        /// Which lookup failed (registry, image stream, local image).
        kind: &'static str,
        /// The name that was searched for.
        value: String,
        /// Why the lookup failed.
        reason: String,
    },
}

/// Strategy that turns a name into zero, one, or many concrete matches.
///
/// Implementations are external collaborators (registry queries, image
/// stream listings, local image catalogs); only their interface is part
/// of the engine.
pub trait ImageLookup: fmt::Debug + Send + Sync {
    /// Returns every match for `term`, possibly none.
    ///
    /// # Errors
    ///
    /// Returns a message describing an infrastructure failure; an empty
    /// result is not an error.
    fn find(&self, term: &str) -> Result<Vec<ComponentMatch>, String>;
}

/// Resolves a name to exactly one match or fails.
pub trait Resolver: fmt::Debug + Send + Sync {
    /// Resolves `value` into exactly one match.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] when nothing matched,
    /// [`ResolveError::Ambiguous`] when several candidates matched, or
    /// [`ResolveError::Lookup`] when the backing lookup failed.
    fn resolve(&self, value: &str) -> Result<ComponentMatch, ResolveError>;
}

/// Adapts one [`ImageLookup`] collaborator into a [`Resolver`].
///
/// Zero candidates map to not-found, more than one to ambiguous.
#[derive(Debug, Clone)]
pub struct LookupResolver {
    /// Provenance label used in diagnostics ("registry", "image stream",
    /// "local image").
    kind: &'static str,
    lookup: Arc<dyn ImageLookup>,
}

impl LookupResolver {
    /// Wraps `lookup` under the given provenance label.
    #[must_use]
    pub fn new(kind: &'static str, lookup: Arc<dyn ImageLookup>) -> Self {
        Self { kind, lookup }
    }
}

impl Resolver for LookupResolver {
    fn resolve(&self, value: &str) -> Result<ComponentMatch, ResolveError> {
        let mut candidates = self
            .lookup
            .find(value)
            .map_err(|reason| ResolveError::Lookup {
                kind: self.kind,
                value: value.to_string(),
                reason,
            })?;
        match candidates.len() {
            0 => Err(ResolveError::NotFound {
                value: value.to_string(),
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(ResolveError::Ambiguous {
                value: value.to_string(),
                candidates,
            }),
        }
    }
}

/// A resolver paired with a numeric weight.
///
/// The weight is an extension point for score-based selection; current
/// wiring always constructs it as `0.0` and [`FirstMatchResolver`] uses
/// declared order only.
#[derive(Debug, Clone)]
pub struct WeightedResolver {
    /// The wrapped strategy.
    pub resolver: Arc<dyn Resolver>,
    /// Relative weight. Not used for scoring in the current algorithm.
    pub weight: f32,
}

/// Ordered combinator: the first strategy yielding exactly one candidate
/// wins, irrespective of later strategies.
///
/// Ambiguous strategies are skipped but their candidates accumulate, so a
/// terminal failure can list everything that was seen.
#[derive(Debug, Clone, Default)]
pub struct FirstMatchResolver {
    /// The strategies to try, in declared order.
    pub resolvers: Vec<WeightedResolver>,
}

impl FirstMatchResolver {
    /// Builds a combinator over the given strategies.
    #[must_use]
    pub fn new(resolvers: Vec<WeightedResolver>) -> Self {
        Self { resolvers }
    }
}

impl Resolver for FirstMatchResolver {
    fn resolve(&self, value: &str) -> Result<ComponentMatch, ResolveError> {
        let mut candidates = Vec::new();
        let mut lookup_failure = None;
        for weighted in &self.resolvers {
            match weighted.resolver.resolve(value) {
                Ok(found) => {
                    tracing::debug!(value, %found, "resolved");
                    return Ok(found);
                }
                Err(ResolveError::NotFound { .. }) => {}
                Err(ResolveError::Ambiguous {
                    candidates: mut more,
                    ..
                }) => candidates.append(&mut more),
                // Remember the failure but let later strategies try.
                Err(err @ ResolveError::Lookup { .. }) => {
                    if lookup_failure.is_none() {
                        lookup_failure = Some(err);
                    }
                }
            }
        }
        if !candidates.is_empty() {
            return Err(ResolveError::Ambiguous {
                value: value.to_string(),
                candidates,
            });
        }
        if let Some(err) = lookup_failure {
            return Err(err);
        }
        Err(ResolveError::NotFound {
            value: value.to_string(),
        })
    }
}

/// In-memory lookup over a fixed table of matches.
///
/// Terms are compared case-insensitively against each entry's `term`.
#[derive(Debug, Clone, Default)]
pub struct TableLookup {
    /// The fixed set of matches served by this lookup.
    pub entries: Vec<ComponentMatch>,
}

impl TableLookup {
    /// Builds a lookup over the given matches.
    #[must_use]
    pub fn new(entries: Vec<ComponentMatch>) -> Self {
        Self { entries }
    }
}

impl ImageLookup for TableLookup {
    fn find(&self, term: &str) -> Result<Vec<ComponentMatch>, String> {
        let needle = term.to_lowercase();
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.term.to_lowercase() == needle)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_match(term: &str, image: &str, builder: bool) -> ComponentMatch {
        ComponentMatch {
            term: term.into(),
            image: ImageRef::parse(image).expect("parse failed"),
            name: image.into(),
            description: String::new(),
            builder,
            ports: Vec::new(),
        }
    }

    fn lookup_resolver(kind: &'static str, entries: Vec<ComponentMatch>) -> Arc<dyn Resolver> {
        Arc::new(LookupResolver::new(kind, Arc::new(TableLookup::new(entries))))
    }

    #[derive(Debug)]
    struct BrokenLookup;

    impl ImageLookup for BrokenLookup {
        fn find(&self, _term: &str) -> Result<Vec<ComponentMatch>, String> {
            Err("connection refused".into())
        }
    }

    #[test]
    fn lookup_resolver_single_candidate_resolves() {
        let resolver = lookup_resolver("registry", vec![image_match("nginx", "nginx", false)]);
        let found = resolver.resolve("nginx").expect("resolve failed");
        assert_eq!(found.image.name, "nginx");
    }

    #[test]
    fn lookup_resolver_zero_candidates_is_not_found() {
        let resolver = lookup_resolver("registry", Vec::new());
        assert!(matches!(
            resolver.resolve("ghost"),
            Err(ResolveError::NotFound { .. })
        ));
    }

    #[test]
    fn lookup_resolver_many_candidates_is_ambiguous() {
        let resolver = lookup_resolver(
            "registry",
            vec![
                image_match("mysql", "redhat/mysql:5.6", false),
                image_match("mysql", "mysql", false),
            ],
        );
        let err = resolver.resolve("mysql").unwrap_err();
        let ResolveError::Ambiguous { candidates, .. } = err else {
            panic!("expected ambiguous, got: {err}");
        };
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn lookup_resolver_case_insensitive_term_match() {
        let resolver = lookup_resolver("registry", vec![image_match("MySQL", "mysql", false)]);
        assert!(resolver.resolve("mysql").is_ok());
    }

    #[test]
    fn combinator_first_unambiguous_wins() {
        // R1 resolves exactly once; R2's content must not matter.
        let combinator = FirstMatchResolver::new(vec![
            WeightedResolver {
                resolver: lookup_resolver("image stream", vec![image_match("php", "streams/php", true)]),
                weight: 0.0,
            },
            WeightedResolver {
                resolver: lookup_resolver("registry", vec![image_match("php", "redhat/php:5", true)]),
                weight: 0.0,
            },
        ]);
        let found = combinator.resolve("php").expect("resolve failed");
        assert_eq!(found.image.to_string(), "streams/php");
    }

    #[test]
    fn combinator_skips_ambiguous_strategy() {
        let combinator = FirstMatchResolver::new(vec![
            WeightedResolver {
                resolver: lookup_resolver(
                    "image stream",
                    vec![
                        image_match("app", "streams/app:1", false),
                        image_match("app", "streams/app:2", false),
                    ],
                ),
                weight: 0.0,
            },
            WeightedResolver {
                resolver: lookup_resolver("registry", vec![image_match("app", "hub/app", false)]),
                weight: 0.0,
            },
        ]);
        let found = combinator.resolve("app").expect("resolve failed");
        assert_eq!(found.image.to_string(), "hub/app");
    }

    #[test]
    fn combinator_all_ambiguous_reports_every_candidate() {
        let combinator = FirstMatchResolver::new(vec![
            WeightedResolver {
                resolver: lookup_resolver(
                    "image stream",
                    vec![
                        image_match("app", "streams/app:1", false),
                        image_match("app", "streams/app:2", false),
                    ],
                ),
                weight: 0.0,
            },
            WeightedResolver {
                resolver: lookup_resolver(
                    "registry",
                    vec![
                        image_match("app", "hub/app:1", false),
                        image_match("app", "hub/app:2", false),
                    ],
                ),
                weight: 0.0,
            },
        ]);
        let err = combinator.resolve("app").unwrap_err();
        let ResolveError::Ambiguous { candidates, .. } = err else {
            panic!("expected ambiguous, got: {err}");
        };
        assert_eq!(candidates.len(), 4);
        // Strategy order is preserved in the candidate list.
        assert_eq!(candidates[0].image.to_string(), "streams/app:1");
        assert_eq!(candidates[3].image.to_string(), "hub/app:2");
    }

    #[test]
    fn combinator_empty_is_not_found() {
        let combinator = FirstMatchResolver::default();
        assert!(matches!(
            combinator.resolve("anything"),
            Err(ResolveError::NotFound { .. })
        ));
    }

    #[test]
    fn combinator_lookup_failure_surfaces_when_nothing_matches() {
        let combinator = FirstMatchResolver::new(vec![
            WeightedResolver {
                resolver: Arc::new(LookupResolver::new("registry", Arc::new(BrokenLookup))),
                weight: 0.0,
            },
            WeightedResolver {
                resolver: lookup_resolver("local image", Vec::new()),
                weight: 0.0,
            },
        ]);
        let err = combinator.resolve("nginx").unwrap_err();
        assert!(matches!(err, ResolveError::Lookup { .. }), "got: {err}");
    }

    #[test]
    fn combinator_later_strategy_recovers_from_lookup_failure() {
        let combinator = FirstMatchResolver::new(vec![
            WeightedResolver {
                resolver: Arc::new(LookupResolver::new("registry", Arc::new(BrokenLookup))),
                weight: 0.0,
            },
            WeightedResolver {
                resolver: lookup_resolver("local image", vec![image_match("nginx", "nginx", false)]),
                weight: 0.0,
            },
        ]);
        assert!(combinator.resolve("nginx").is_ok());
    }
}
