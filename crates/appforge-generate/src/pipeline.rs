//! Build/deploy pipeline assembly and group reduction.
//!
//! A pipeline is the recipe for one deployable unit: either a build from
//! source on top of a base image, or a plain existing image. Pipelines in
//! one user-declared group are reduced so an identical build/image target
//! is emitted exactly once per group.

use std::fmt;

use appforge_common::types::ImageRef;

use crate::env::Environment;
use crate::error::GenerateError;
use crate::source::SourceId;

/// How source code is turned into a runnable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Layered build driven by the repository's own Dockerfile.
    Docker,
    /// Source-strategy build on top of a builder image.
    Source,
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Docker => write!(f, "docker"),
            Self::Source => write!(f, "source"),
        }
    }
}

/// The deployment every pipeline carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequirement {
    /// Object name for the deployment.
    pub name: String,
    /// Environment applied to the deployed containers.
    pub env: Environment,
    /// Ports the deployed image exposes.
    pub ports: Vec<u16>,
}

/// The two pipeline shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineKind {
    /// Build source into a new image on top of `input`.
    Build {
        /// Base/builder image the build starts from.
        input: ImageRef,
        /// Image produced by the build.
        output: ImageRef,
        /// Docker-layered or source-strategy build.
        strategy: BuildStrategy,
        /// The associated source repository.
        source: SourceId,
    },
    /// Deploy an existing image unchanged.
    Image {
        /// The image to deploy.
        input: ImageRef,
    },
}

/// The build-and-deploy recipe for one deployable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// The reference token this pipeline was assembled from.
    pub from: String,
    /// Build or plain-image shape.
    pub kind: PipelineKind,
    /// Deployment derived from the supplied environment.
    pub deployment: Option<DeploymentRequirement>,
}

impl Pipeline {
    /// Assembles a build pipeline from a base image and a source
    /// repository.
    ///
    /// The output image is named after the base image's repository name,
    /// tagged `latest`.
    #[must_use]
    pub fn new_build(
        from: impl Into<String>,
        input: ImageRef,
        strategy: BuildStrategy,
        source: SourceId,
    ) -> Self {
        let output = ImageRef {
            registry: None,
            namespace: None,
            name: input.suggest_name().to_string(),
            tag: Some("latest".to_string()),
        };
        Self {
            from: from.into(),
            kind: PipelineKind::Build {
                input,
                output,
                strategy,
                source,
            },
            deployment: None,
        }
    }

    /// Assembles a plain image pipeline.
    #[must_use]
    pub fn new_image(from: impl Into<String>, input: ImageRef) -> Self {
        Self {
            from: from.into(),
            kind: PipelineKind::Image { input },
            deployment: None,
        }
    }

    /// Attaches the deployment requirement derived from `env`.
    pub fn needs_deployment(&mut self, env: Environment, ports: Vec<u16>) {
        self.deployment = Some(DeploymentRequirement {
            name: self.target_image().suggest_name().to_string(),
            env,
            ports,
        });
    }

    /// The image this pipeline ultimately provides: the build output for
    /// build pipelines, the input for image pipelines.
    #[must_use]
    pub fn target_image(&self) -> &ImageRef {
        match &self.kind {
            PipelineKind::Build { output, .. } => output,
            PipelineKind::Image { input } => input,
        }
    }

    fn is_build(&self) -> bool {
        matches!(self.kind, PipelineKind::Build { .. })
    }
}

/// Ordered collection of pipelines sharing one group tag.
#[derive(Debug, Clone, Default)]
pub struct PipelineGroup {
    /// The pipelines, in reference order.
    pub pipelines: Vec<Pipeline>,
}

impl PipelineGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pipeline.
    pub fn push(&mut self, pipeline: Pipeline) {
        self.pipelines.push(pipeline);
    }

    /// Merges pipelines resolving to an identical build/image target,
    /// keeping the first occurrence of each.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Reduction`] when two pipelines share a
    /// target but disagree on shape (one builds, one deploys as-is).
    pub fn reduce(&mut self, group: &str) -> Result<(), GenerateError> {
        let mut kept: Vec<Pipeline> = Vec::with_capacity(self.pipelines.len());
        for pipeline in self.pipelines.drain(..) {
            let target = pipeline.target_image().to_string();
            match kept
                .iter()
                .find(|p| p.target_image().to_string() == target)
            {
                None => kept.push(pipeline),
                Some(first) if first.is_build() == pipeline.is_build() => {
                    tracing::debug!(group, target, from = %pipeline.from, "merged duplicate pipeline");
                }
                Some(_) => {
                    return Err(GenerateError::Reduction {
                        group: group.to_string(),
                        reason: format!(
                            "{target:?} is both built from source and deployed as an existing image"
                        ),
                    });
                }
            }
        }
        self.pipelines = kept;
        Ok(())
    }

    /// Number of pipelines in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Whether the group holds no pipelines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceRegistry;

    fn image(name: &str) -> ImageRef {
        ImageRef::parse(name).expect("parse failed")
    }

    #[test]
    fn build_pipeline_output_named_after_base_image() {
        let mut sources = SourceRegistry::new();
        let source = sources.add("./app");
        let pipeline = Pipeline::new_build("php", image("redhat/php:5"), BuildStrategy::Source, source);
        assert_eq!(pipeline.target_image().to_string(), "php:latest");
    }

    #[test]
    fn image_pipeline_target_is_input() {
        let pipeline = Pipeline::new_image("mysql", image("redhat/mysql:5.6"));
        assert_eq!(pipeline.target_image().to_string(), "redhat/mysql:5.6");
    }

    #[test]
    fn needs_deployment_derives_name_from_target() {
        let mut pipeline = Pipeline::new_image("mysql", image("redhat/mysql:5.6"));
        let mut env = Environment::new();
        let _ = env.set("MYSQL_USER", "admin");
        pipeline.needs_deployment(env, vec![3306]);
        let deployment = pipeline.deployment.expect("no deployment");
        assert_eq!(deployment.name, "mysql");
        assert_eq!(deployment.env.get("MYSQL_USER"), Some("admin"));
        assert_eq!(deployment.ports, vec![3306]);
    }

    #[test]
    fn reduce_merges_identical_targets_first_wins() {
        let mut group = PipelineGroup::new();
        group.push(Pipeline::new_image("mysql", image("redhat/mysql:5.6")));
        group.push(Pipeline::new_image("mysql-again", image("redhat/mysql:5.6")));
        group.reduce("db").expect("reduce failed");
        assert_eq!(group.len(), 1);
        assert_eq!(group.pipelines[0].from, "mysql");
    }

    #[test]
    fn reduce_keeps_distinct_targets() {
        let mut group = PipelineGroup::new();
        group.push(Pipeline::new_image("mysql", image("redhat/mysql:5.6")));
        group.push(Pipeline::new_image("redis", image("redis")));
        group.reduce("db").expect("reduce failed");
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn reduce_conflicting_shapes_is_error() {
        let mut sources = SourceRegistry::new();
        let source = sources.add("./app");
        let mut group = PipelineGroup::new();
        // Build output "php:latest" collides with the plain image below.
        group.push(Pipeline::new_build("php", image("php"), BuildStrategy::Source, source));
        group.push(Pipeline::new_image("php:latest", image("php:latest")));
        let err = group.reduce("web").unwrap_err();
        assert!(err.to_string().contains("php:latest"), "got: {err}");
    }
}
