//! Top-level orchestration.
//!
//! `AppGenerator` sequences the whole run: classify → build references →
//! resolve → associate source → detect undeclared source types → assemble
//! and reduce pipelines → realize objects → synthesize services. Errors
//! from independent items aggregate within a stage; a failed stage
//! short-circuits the stages after it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::classify::classify_arguments;
use crate::detect::{ImageSearcher, SourceDetector};
use crate::env::{parse_environment, Environment};
use crate::error::{into_result, GenerateError};
use crate::objects::{add_services, AcceptFirst, List};
use crate::pipeline::{BuildStrategy, Pipeline, PipelineGroup};
use crate::reference::{ComponentReference, ReferenceBuilder};
use crate::resolve::{
    FirstMatchResolver, ImageLookup, LookupResolver, Resolver, WeightedResolver,
};
use crate::source::SourceRegistry;

/// Explicit build mode forced by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Layered Docker build: the resolved image is a plain base.
    Docker,
    /// Source-strategy build on a builder image.
    Source,
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docker" => Ok(Self::Docker),
            "source" => Ok(Self::Source),
            other => Err(format!("unknown build mode {other:?} (expected docker or source)")),
        }
    }
}

/// Configuration and collaborators for one generation run.
#[derive(Debug)]
pub struct AppGenerator {
    /// Declared source-code locations (`--code` plus classified tokens).
    pub source_repositories: Vec<String>,
    /// Bare/ambiguous component tokens.
    pub components: Vec<String>,
    /// Explicit image-stream references (`--image`).
    pub image_streams: Vec<String>,
    /// Explicit registry-image references (`--registry-image`).
    pub registry_images: Vec<String>,
    /// Explicit group declarations (`--group name1+name2`).
    pub groups: Vec<String>,
    /// Raw `KEY=VALUE` environment tokens.
    pub environment: Vec<String>,
    /// Build mode forced by the caller, if any.
    pub build_mode: Option<BuildMode>,

    stream_resolver: Arc<dyn Resolver>,
    registry_resolver: Arc<dyn Resolver>,
    local_resolver: Arc<dyn Resolver>,
    searcher: Box<dyn ImageSearcher>,
    detector: Box<dyn SourceDetector>,
}

impl AppGenerator {
    /// Wires a generator over the three lookup collaborators, a builder
    /// image searcher, and a source detector.
    #[must_use]
    pub fn new(
        streams: Arc<dyn ImageLookup>,
        registry: Arc<dyn ImageLookup>,
        local_images: Arc<dyn ImageLookup>,
        searcher: Box<dyn ImageSearcher>,
        detector: Box<dyn SourceDetector>,
    ) -> Self {
        Self {
            source_repositories: Vec::new(),
            components: Vec::new(),
            image_streams: Vec::new(),
            registry_images: Vec::new(),
            groups: Vec::new(),
            environment: Vec::new(),
            build_mode: None,
            stream_resolver: Arc::new(LookupResolver::new("image stream", streams)),
            registry_resolver: Arc::new(LookupResolver::new("registry", registry)),
            local_resolver: Arc::new(LookupResolver::new("local image", local_images)),
            searcher,
            detector,
        }
    }

    /// Classifies raw tokens into this generator's buckets and returns
    /// the tokens it could not place.
    pub fn add_arguments<S: AsRef<str>>(&mut self, args: &[S]) -> Vec<String> {
        let buckets = classify_arguments(args);
        self.environment.extend(buckets.environment);
        self.source_repositories.extend(buckets.sources);
        self.components.extend(buckets.components);
        buckets.unknown
    }

    /// Turns the accumulated buckets into typed references, a source
    /// registry, and a parsed environment.
    ///
    /// # Errors
    ///
    /// Returns the aggregate of every per-token syntax error, plus a
    /// build-requires-source error when `--build` was given without any
    /// code location.
    pub fn validate(
        &self,
    ) -> Result<(Vec<ComponentReference>, SourceRegistry, Environment), GenerateError> {
        let mut builder = ReferenceBuilder::new();
        for location in &self.source_repositories {
            builder.add_source_repository(location.clone());
        }

        let registry = Arc::clone(&self.registry_resolver);
        builder.add_images(&self.registry_images, |part| {
            (format!("--registry-image={part:?}"), Arc::clone(&registry))
        });

        let streams = Arc::clone(&self.stream_resolver);
        builder.add_images(&self.image_streams, |part| {
            (format!("--image={part:?}"), Arc::clone(&streams))
        });

        let ordered: Arc<dyn Resolver> = Arc::new(FirstMatchResolver::new(vec![
            WeightedResolver {
                resolver: Arc::clone(&self.stream_resolver),
                weight: 0.0,
            },
            WeightedResolver {
                resolver: Arc::clone(&self.registry_resolver),
                weight: 0.0,
            },
            WeightedResolver {
                resolver: Arc::clone(&self.local_resolver),
                weight: 0.0,
            },
        ]));
        builder.add_images(&self.components, |part| {
            (part.to_string(), Arc::clone(&ordered))
        });

        builder.add_groups(&self.groups);
        let (mut references, sources, mut errors) = builder.result();

        if self.build_mode.is_some() {
            if sources.is_empty() {
                errors.push(GenerateError::BuildRequiresSource);
            }
            // An explicit build mode means every reference builds source.
            for reference in &mut references {
                reference.set_expect_to_build(true);
            }
        }

        let (environment, overwritten, env_errors) = parse_environment(&self.environment);
        for key in overwritten {
            tracing::info!(key, "environment variable was overwritten");
        }
        errors.extend(env_errors);

        into_result(errors)?;
        Ok((references, sources, environment))
    }

    /// Resolves every reference in input order, then reconciles build
    /// expectations with match capabilities.
    ///
    /// # Errors
    ///
    /// Returns the aggregate of every resolution and consistency error;
    /// the full set is processed before returning.
    pub fn resolve(&self, references: &mut [ComponentReference]) -> Result<(), GenerateError> {
        let mut errors = Vec::new();
        for reference in references.iter_mut() {
            if let Err(err) = reference.resolve() {
                errors.push(GenerateError::Resolution(err));
                continue;
            }
            let Some(found) = reference.resolved() else {
                continue;
            };
            match (reference.expect_to_build(), found.builder) {
                (false, true) => {
                    if self.build_mode != Some(BuildMode::Docker) {
                        tracing::info!(
                            reference = %reference,
                            image = %found.image,
                            "image is a builder, so a source repository will be expected \
                             unless you also specify --build docker"
                        );
                        reference.set_expect_to_build(true);
                    }
                }
                (true, false) => {
                    // --build docker treats the image as a plain layered base.
                    if self.build_mode != Some(BuildMode::Docker) {
                        errors.push(GenerateError::BuildConsistency {
                            token: reference.value().to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
        into_result(errors)
    }

    /// Ensures every reference that builds source has a repository.
    ///
    /// Exactly one declared repository is broadcast to every build-needing
    /// reference; zero or several repositories are cardinality errors.
    ///
    /// # Errors
    ///
    /// Returns an association error naming the unsatisfied component(s).
    pub fn ensure_has_source(
        &self,
        references: &mut [ComponentReference],
        sources: &mut SourceRegistry,
    ) -> Result<(), GenerateError> {
        let needing: Vec<usize> = references
            .iter()
            .enumerate()
            .filter(|(_, r)| r.expect_to_build() && r.uses().is_none())
            .map(|(index, _)| index)
            .collect();
        if needing.is_empty() {
            return Ok(());
        }

        match sources.len() {
            0 => {
                if let [only] = needing[..] {
                    Err(GenerateError::SourceRequired {
                        component: references[only].value().to_string(),
                    })
                } else {
                    Err(GenerateError::SourceRequiredMany {
                        components: needing
                            .iter()
                            .map(|&i| references[i].value().to_string())
                            .collect(),
                    })
                }
            }
            1 => {
                let id = sources.ids()[0];
                if let Some(repository) = sources.get(id) {
                    tracing::info!(source = repository.location(), "using as the source for build");
                }
                for &index in &needing {
                    references[index].use_source(id);
                    if let Some(repository) = sources.get_mut(id) {
                        repository.record_use(index);
                    }
                }
                Ok(())
            }
            _ => {
                if let [only] = needing[..] {
                    Err(GenerateError::SourceAmbiguous {
                        component: references[only].value().to_string(),
                    })
                } else {
                    Err(GenerateError::SourceAmbiguousMany)
                }
            }
        }
    }

    /// Detects the source type of every repository not already associated
    /// with a component.
    ///
    /// A Dockerfile marks the repository for a layered Docker build and
    /// the searcher is never consulted. Otherwise detected candidates are
    /// reported for user confirmation; they are never auto-applied, even
    /// when there is exactly one.
    ///
    /// # Errors
    ///
    /// Returns the aggregate of every per-repository error; one failure
    /// never blocks evaluation of the remaining repositories.
    pub fn detect_source(&self, sources: &mut SourceRegistry) -> Result<(), GenerateError> {
        let mut errors = Vec::new();
        for id in sources.ids() {
            let Some(repository) = sources.get_mut(id) else {
                continue;
            };
            if repository.in_use() {
                continue;
            }
            let location = repository.location().to_string();
            let path = match repository.local_path() {
                Ok(path) => path.to_path_buf(),
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };
            let info = match self.detector.detect(&path) {
                Ok(info) => info,
                Err(reason) => {
                    errors.push(GenerateError::Detection { location, reason });
                    continue;
                }
            };
            if info.dockerfile {
                tracing::debug!(source = location, "found a Dockerfile, using a docker build");
                repository.build_with_docker();
                continue;
            }
            match self.searcher.search(&info.terms) {
                Err(reason) => errors.push(GenerateError::Search { location, reason }),
                Ok(matches) if matches.is_empty() => errors.push(GenerateError::NoBuilderFound {
                    location,
                    terms: info.terms,
                }),
                Ok(matches) => errors.push(GenerateError::BuilderCandidates {
                    location,
                    candidates: matches.iter().map(ToString::to_string).collect(),
                }),
            }
        }
        into_result(errors)
    }

    /// Converts resolved, associated references into reduced pipelines.
    ///
    /// # Errors
    ///
    /// Fatal on the first construction or reduction failure, naming the
    /// reference (or group) that triggered it.
    pub fn build_pipelines(
        &self,
        references: &[ComponentReference],
        sources: &SourceRegistry,
        environment: &Environment,
    ) -> Result<Vec<Pipeline>, GenerateError> {
        let mut pipelines = Vec::new();
        for (key, members) in group_references(references) {
            tracing::debug!(group = %key, size = members.len(), "assembling group");
            let mut group = PipelineGroup::new();
            for reference in members {
                let found = reference.resolved().ok_or_else(|| {
                    GenerateError::PipelineConstruction {
                        token: reference.value().to_string(),
                        reason: "reference was never resolved".into(),
                    }
                })?;
                let mut pipeline = if reference.expect_to_build() {
                    let source = reference.uses().ok_or_else(|| {
                        GenerateError::PipelineConstruction {
                            token: reference.value().to_string(),
                            reason: "no source repository associated with the build".into(),
                        }
                    })?;
                    let docker = self.build_mode == Some(BuildMode::Docker)
                        || sources.get(source).is_some_and(|r| r.is_docker_build());
                    let strategy = if docker {
                        BuildStrategy::Docker
                    } else {
                        BuildStrategy::Source
                    };
                    tracing::debug!(
                        reference = %reference,
                        base = %found.image,
                        %strategy,
                        "assembling a source build"
                    );
                    Pipeline::new_build(reference.value(), found.image.clone(), strategy, source)
                } else {
                    tracing::debug!(reference = %reference, image = %found.image, "including image");
                    Pipeline::new_image(reference.value(), found.image.clone())
                };
                pipeline.needs_deployment(environment.clone(), found.ports.clone());
                group.push(pipeline);
            }
            group.reduce(&key.to_string())?;
            pipelines.extend(group.pipelines);
        }
        Ok(pipelines)
    }

    /// Executes the whole run.
    ///
    /// When neither source nor component input was supplied at all, the
    /// `help` callback is invoked and no list is produced. Otherwise the
    /// final ordered object list is returned for the caller to serialize.
    ///
    /// # Errors
    ///
    /// Returns the first failed stage's (possibly aggregated) error.
    pub fn run(&self, help: impl FnOnce()) -> Result<Option<List>, GenerateError> {
        let (mut references, mut sources, environment) = self.validate()?;

        if references.is_empty() && sources.is_empty() {
            help();
            return Ok(None);
        }

        self.resolve(&mut references)?;
        self.ensure_has_source(&mut references, &mut sources)?;
        self.detect_source(&mut sources)?;

        let pipelines = self.build_pipelines(&references, &sources, &environment)?;

        let mut accept = AcceptFirst::new();
        let mut objects = Vec::new();
        for pipeline in &pipelines {
            objects.extend(pipeline.objects(&sources, &mut accept)?);
        }
        let objects = add_services(objects);
        tracing::info!(objects = objects.len(), pipelines = pipelines.len(), "run complete");
        Ok(Some(List::new(objects)))
    }
}

/// Key a reference is grouped under. A declared tag never collides with
/// a singleton key, whatever the tag is spelled like.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupKey {
    /// User-declared group tag.
    Tag(String),
    /// Ungrouped reference, keyed by its input position.
    Singleton(usize),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Singleton(index) => write!(f, "#{index}"),
        }
    }
}

/// Groups references by declared tag, preserving first-appearance order;
/// untagged references form singleton groups.
fn group_references(
    references: &[ComponentReference],
) -> Vec<(GroupKey, Vec<&ComponentReference>)> {
    let mut groups: Vec<(GroupKey, Vec<&ComponentReference>)> = Vec::new();
    for (index, reference) in references.iter().enumerate() {
        let key = reference
            .group()
            .map_or(GroupKey::Singleton(index), |tag| {
                GroupKey::Tag(tag.to_string())
            });
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(reference),
            None => groups.push((key, vec![reference])),
        }
    }
    groups
}
