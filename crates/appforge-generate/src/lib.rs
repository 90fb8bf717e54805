//! # appforge-generate
//!
//! The reference-resolution and pipeline-assembly engine.
//!
//! Turns heterogeneous user input (source-code locations, image names,
//! image-stream names, grouped references, environment assignments) into
//! a validated set of build/deploy pipelines rendered as a deployable
//! object list.
//!
//! Handles:
//! - **Classify**: Bucketing raw tokens into environment/source/component/unknown.
//! - **Reference**: Typed references with per-provenance resolver wiring.
//! - **Resolve**: Ordered multi-strategy name resolution with ambiguity detection.
//! - **Source**: Source repository registry and component association.
//! - **Detect**: Source-type detection and builder-image search collaborators.
//! - **Pipeline**: Build/image pipeline assembly and group reduction.
//! - **Objects**: Realization into a deduplicated deployable object list.
//! - **Generator**: The top-level orchestrator sequencing all stages.

pub mod classify;
pub mod detect;
pub mod env;
pub mod error;
pub mod generator;
pub mod objects;
pub mod pipeline;
pub mod reference;
pub mod resolve;
pub mod source;

pub use classify::{classify_arguments, Buckets};
pub use detect::{ImageSearcher, SignalFileDetector, SourceDetector, SourceInfo, StaticSearcher};
pub use env::Environment;
pub use error::GenerateError;
pub use generator::{AppGenerator, BuildMode};
pub use objects::{add_services, Accept, AcceptFirst, List, Object, ObjectKind};
pub use pipeline::{BuildStrategy, Pipeline, PipelineGroup, PipelineKind};
pub use reference::{ComponentReference, ReferenceBuilder};
pub use resolve::{
    ComponentMatch, FirstMatchResolver, ImageLookup, LookupResolver, ResolveError, Resolver,
    TableLookup, WeightedResolver,
};
pub use source::{SourceId, SourceRegistry, SourceRepository};
