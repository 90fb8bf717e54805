//! Shared error primitives for the appforge workspace.
//!
//! Each higher-level crate defines its own domain-specific error enum;
//! this module provides the pieces they have in common, most importantly
//! the [`Aggregate`] multi-error container used by every batch stage.

use std::fmt;

use thiserror::Error;

/// A collection of errors from independent items, reported together.
///
/// Batch stages (resolving a set of references, detecting a set of source
/// repositories) never fail fast: each item's error is appended and the
/// whole collection is returned once the stage has seen every item.
#[derive(Debug, Error)]
pub struct Aggregate<E: std::error::Error> {
    /// The collected errors, in the order the offending items appeared.
    pub errors: Vec<E>,
}

impl<E: std::error::Error> Aggregate<E> {
    /// Wraps a non-empty collection of errors.
    ///
    /// Returns `None` when `errors` is empty, so callers can write
    /// `Aggregate::from_errors(errs).map_or(Ok(()), Err)`.
    #[must_use]
    pub fn from_errors(errors: Vec<E>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Appends the errors of another aggregate onto this one.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the aggregate holds no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<E: std::error::Error> fmt::Display for Aggregate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            return write!(f, "{}", self.errors[0]);
        }
        writeln!(f, "{} errors occurred:", self.errors.len())?;
        for err in &self.errors {
            writeln!(f, "  * {err}")?;
        }
        Ok(())
    }
}

/// Converts a collection of errors into a single result.
///
/// # Errors
///
/// Returns `Err(Aggregate)` when `errors` is non-empty.
pub fn aggregate<E: std::error::Error>(errors: Vec<E>) -> Result<(), Aggregate<E>> {
    Aggregate::from_errors(errors).map_or(Ok(()), Err)
}

/// An image reference string could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid image reference {value:?}: {reason}")]
pub struct ImageRefError {
    /// The offending input string.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}
