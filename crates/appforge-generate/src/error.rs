//! Error types for the generation engine.
//!
//! Errors from independent items (distinct references, distinct source
//! repositories) are collected per stage and reported together through
//! [`Aggregate`]; structural conflicts short-circuit between stages.
//! Every fatal variant carries the literal offending token or location.

use appforge_common::error::Aggregate;
use thiserror::Error;

use crate::resolve::ResolveError;

/// Errors produced while turning user input into pipelines and objects.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A token could not be turned into a component reference.
    #[error("invalid component reference {token:?}: {reason}")]
    ReferenceSyntax {
        /// The offending input token.
        token: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An environment token was not of the form `KEY=VALUE`.
    #[error("invalid environment assignment {token:?}: expected KEY=VALUE")]
    EnvironmentSyntax {
        /// The offending input token.
        token: String,
    },

    /// A reference failed to resolve to exactly one match.
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    /// A reference expects to build but its match cannot build source.
    #[error(
        "none of the images that match {token:?} can build source code - check whether this \
         is the image you want to use, then use --build source to build using source or \
         --build docker to treat this as a Docker base image and set up a layered Docker build"
    )]
    BuildConsistency {
        /// The reference whose match lacks build capability.
        token: String,
    },

    /// `--build` was given without any source code location.
    #[error("when --build is specified you must provide at least one source code location")]
    BuildRequiresSource,

    /// One component needs source but none was provided.
    #[error(
        "the image {component:?} will build source code, so you must specify a repository \
         via --code"
    )]
    SourceRequired {
        /// The component that needs source.
        component: String,
    },

    /// Several components need source but none was provided.
    #[error(
        "you must provide at least one source code repository with --code for the images: {}",
        components.join(", ")
    )]
    SourceRequiredMany {
        /// The components that need source.
        components: Vec<String>,
    },

    /// One component needs source but several repositories were provided.
    #[error(
        "there are multiple code locations provided - use '{component}~<repo>' to declare \
         which code goes with the image"
    )]
    SourceAmbiguous {
        /// The single component left unsatisfied.
        component: String,
    },

    /// Several components need source and several repositories were provided.
    #[error(
        "there are multiple code locations provided - use '[image]~[repo]' to declare which \
         code goes with which image"
    )]
    SourceAmbiguousMany,

    /// A source repository's local path could not be resolved.
    #[error("cannot resolve a local path for source repository {location:?}: {reason}")]
    LocalPath {
        /// The repository location as given by the user.
        location: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The source detector failed on a repository.
    #[error("could not detect the type of source repository {location:?}: {reason}")]
    Detection {
        /// The repository location as given by the user.
        location: String,
        /// Why detection failed.
        reason: String,
    },

    /// The builder-image search itself failed.
    #[error("builder image search for source repository {location:?} failed: {reason}")]
    Search {
        /// The repository location as given by the user.
        location: String,
        /// Why the search failed.
        reason: String,
    },

    /// No builder image matched the detected source signals.
    #[error(
        "we could not find any images that match the source repository {location:?} \
         (looked for: {}) and this repository does not have a Dockerfile - you'll need to \
         choose a source builder image to continue",
        terms.join(", ")
    )]
    NoBuilderFound {
        /// The repository location as given by the user.
        location: String,
        /// The search terms that were tried.
        terms: Vec<String>,
    },

    /// Builder images matched but must be confirmed by the user.
    ///
    /// Detected candidates are never auto-applied, even when there is
    /// exactly one.
    #[error(
        "found the following possible images to use to build source repository \
         {location:?}: {} - to continue, specify which image to use with {location:?}",
        candidates.join(", ")
    )]
    BuilderCandidates {
        /// The repository location as given by the user.
        location: String,
        /// Display forms of the candidate matches.
        candidates: Vec<String>,
    },

    /// A pipeline could not be constructed for a reference.
    #[error("cannot build {token:?}: {reason}")]
    PipelineConstruction {
        /// The reference that triggered the failure.
        token: String,
        /// Why construction failed.
        reason: String,
    },

    /// A pipeline group could not be reduced.
    #[error("cannot create a pipeline from group {group:?}: {reason}")]
    Reduction {
        /// The group tag being reduced.
        group: String,
        /// Why reduction failed.
        reason: String,
    },

    /// Multiple independent errors from one stage.
    #[error(transparent)]
    Aggregate(#[from] Aggregate<GenerateError>),
}

/// Converts the errors collected by a stage into a single result.
///
/// # Errors
///
/// Returns the sole error unchanged when there is exactly one, or a
/// [`GenerateError::Aggregate`] when there are several.
pub fn into_result(mut errors: Vec<GenerateError>) -> Result<(), GenerateError> {
    if errors.len() == 1 {
        return Err(errors.remove(0));
    }
    Aggregate::from_errors(errors).map_or(Ok(()), |agg| Err(GenerateError::Aggregate(agg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_result_empty_is_ok() {
        assert!(into_result(Vec::new()).is_ok());
    }

    #[test]
    fn into_result_single_error_passes_through() {
        let err = into_result(vec![GenerateError::BuildRequiresSource]).unwrap_err();
        assert!(matches!(err, GenerateError::BuildRequiresSource));
    }

    #[test]
    fn into_result_many_aggregates() {
        let err = into_result(vec![
            GenerateError::BuildRequiresSource,
            GenerateError::EnvironmentSyntax {
                token: "=oops".into(),
            },
        ])
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("2 errors occurred"), "got: {msg}");
        assert!(msg.contains("=oops"), "got: {msg}");
    }

    #[test]
    fn source_required_many_lists_components() {
        let err = GenerateError::SourceRequiredMany {
            components: vec!["php".into(), "ruby".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("php, ruby"), "got: {msg}");
    }

    #[test]
    fn builder_candidates_names_repository_and_images() {
        let err = GenerateError::BuilderCandidates {
            location: "./app".into(),
            candidates: vec!["PHP 5.5 (redhat/php:5)".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("./app"), "got: {msg}");
        assert!(msg.contains("redhat/php:5"), "got: {msg}");
    }
}
