//! Realization of pipelines into a deployable object list.
//!
//! The platform's full object schema is out of scope; objects are a typed
//! generic container (kind, name, spec payload) that the caller serializes
//! as a whole. An [`Accept`] policy decides which duplicate definitions
//! survive across pipelines; [`add_services`] appends the network-exposure
//! objects implied by the aggregated set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::GenerateError;
use crate::pipeline::{Pipeline, PipelineKind};
use crate::source::SourceRegistry;

/// The kinds of deployable objects this engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A named, versioned pointer to image identities.
    ImageRepository,
    /// A build recipe producing an image.
    BuildConfig,
    /// A deployment of one image.
    DeploymentConfig,
    /// Network exposure for a deployment.
    Service,
}

/// One deployable object: kind, name, and a schema-free spec payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Object kind.
    pub kind: ObjectKind,
    /// Object name, unique per kind within a list.
    pub name: String,
    /// Payload handed to the platform.
    pub spec: serde_json::Value,
}

/// Policy deciding whether an object definition is kept.
pub trait Accept {
    /// Returns `true` when `object` should be kept.
    fn accept(&mut self, object: &Object) -> bool;
}

/// Keeps only the first occurrence of each `(kind, name)` definition.
#[derive(Debug, Default)]
pub struct AcceptFirst {
    seen: HashSet<(ObjectKind, String)>,
}

impl AcceptFirst {
    /// Creates a policy that has seen nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accept for AcceptFirst {
    fn accept(&mut self, object: &Object) -> bool {
        self.seen.insert((object.kind, object.name.clone()))
    }
}

/// The typed list container handed to the serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List {
    /// Always `"List"`.
    pub kind: String,
    /// The ordered objects.
    pub items: Vec<Object>,
}

impl List {
    /// Wraps `items` into a list container.
    #[must_use]
    pub fn new(items: Vec<Object>) -> Self {
        Self {
            kind: "List".to_string(),
            items,
        }
    }
}

impl Pipeline {
    /// Realizes this pipeline into deployable objects, keeping only those
    /// the `accept` policy admits.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::PipelineConstruction`] when a build
    /// pipeline points at a source repository missing from `sources`.
    pub fn objects(
        &self,
        sources: &SourceRegistry,
        accept: &mut dyn Accept,
    ) -> Result<Vec<Object>, GenerateError> {
        let mut objects = Vec::new();
        match &self.kind {
            PipelineKind::Build {
                input,
                output,
                strategy,
                source,
            } => {
                let repository = sources.get(*source).ok_or_else(|| {
                    GenerateError::PipelineConstruction {
                        token: self.from.clone(),
                        reason: "no source repository associated with the build".into(),
                    }
                })?;
                objects.push(Object {
                    kind: ObjectKind::BuildConfig,
                    name: output.suggest_name().to_string(),
                    spec: json!({
                        "source": repository.location(),
                        "strategy": strategy.to_string(),
                        "baseImage": input.to_string(),
                        "output": output.to_string(),
                    }),
                });
                objects.push(Object {
                    kind: ObjectKind::ImageRepository,
                    name: output.suggest_name().to_string(),
                    spec: json!({ "dockerImageReference": output.to_string() }),
                });
            }
            PipelineKind::Image { input } => {
                objects.push(Object {
                    kind: ObjectKind::ImageRepository,
                    name: input.suggest_name().to_string(),
                    spec: json!({ "dockerImageReference": input.to_string() }),
                });
            }
        }

        if let Some(deployment) = &self.deployment {
            let env: Vec<serde_json::Value> = deployment
                .env
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
            objects.push(Object {
                kind: ObjectKind::DeploymentConfig,
                name: deployment.name.clone(),
                spec: json!({
                    "image": self.target_image().to_string(),
                    "env": env,
                    "ports": deployment.ports,
                }),
            });
        }

        Ok(objects
            .into_iter()
            .filter(|object| accept.accept(object))
            .collect())
    }
}

/// Appends one Service per deployment that exposes ports.
///
/// Pure transform: the input objects pass through unchanged and
/// synthesized services are appended, skipping names already present.
#[must_use]
pub fn add_services(objects: Vec<Object>) -> Vec<Object> {
    let existing: HashSet<String> = objects
        .iter()
        .filter(|o| o.kind == ObjectKind::Service)
        .map(|o| o.name.clone())
        .collect();

    let services: Vec<Object> = objects
        .iter()
        .filter(|o| o.kind == ObjectKind::DeploymentConfig)
        .filter(|o| !existing.contains(&o.name))
        .filter_map(|deployment| {
            let ports = deployment.spec.get("ports")?.as_array()?;
            if ports.is_empty() {
                return None;
            }
            Some(Object {
                kind: ObjectKind::Service,
                name: deployment.name.clone(),
                spec: json!({
                    "selector": deployment.name,
                    "ports": ports,
                }),
            })
        })
        .collect();

    let mut out = objects;
    out.extend(services);
    out
}
