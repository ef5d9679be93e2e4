//! Error types for layout computation and memory access.
//!
//! Every fallible library operation fails with exactly one of four kinds:
//! [`LayoutError`] while building a schema, [`BoundsError`] for out-of-range
//! offsets and indices, [`UseAfterFreeError`] for regions whose scope has
//! been released, and [`InvalidArgumentError`] for caller bugs such as a
//! negative element count.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Result alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Umbrella error for the library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    UseAfterFree(#[from] UseAfterFreeError),

    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgumentError),
}

/// Malformed or unsupported schema. Raised at construction time only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("unsupported {kind} width of {width} bytes for `{field}`")]
    UnsupportedWidth {
        field: String,
        kind: &'static str,
        width: usize,
    },

    #[error("unknown type `{type_name}` for `{field}`")]
    UnknownType { field: String, type_name: String },

    #[error("field `{field}` in `{group}`: {reason}")]
    InvalidDeclaration {
        group: String,
        field: String,
        reason: String,
    },

    #[error("duplicate field `{field}` in `{group}`")]
    DuplicateField { group: String, field: String },

    #[error("field in `{group}` has an empty name")]
    EmptyName { group: String },

    #[error("`{field}` in `{group}` has zero length")]
    ZeroLength { group: String, field: String },

    #[error("group `{group}` has no members")]
    EmptyGroup { group: String },

    #[error("group `{group}` is too large to describe")]
    Overflow { group: String },

    #[error("unknown group `{group}`")]
    UnknownGroup { group: String },

    #[error("`{nested}` was computed for `{nested_target}`, but `{group}` targets `{target}`")]
    TargetMismatch {
        group: String,
        target: String,
        nested: String,
        nested_target: String,
    },

    #[error("group `{group}` is already registered")]
    DuplicateGroup { group: String },

    #[error("no field `{path}` in `{group}`")]
    UnknownField { group: String, path: String },

    #[error("`{path}` in `{group}` is {declared}, not {requested}")]
    TypeMismatch {
        group: String,
        path: String,
        declared: String,
        requested: String,
    },
}

/// An access that would leave the addressed span.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("access of {len} bytes at offset {offset} exceeds region of {region_len} bytes")]
    Offset {
        offset: usize,
        len: usize,
        region_len: usize,
    },

    #[error("element index {index} out of range for {count} elements")]
    Index { index: usize, count: usize },
}

/// An access through a region whose scope has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("region of scope #{scope} used after the scope was released")]
pub struct UseAfterFreeError {
    pub scope: u64,
}

/// A caller-supplied argument that can never be valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument: {message}")]
pub struct InvalidArgumentError {
    pub message: String,
}

impl InvalidArgumentError {
    pub fn new(message: impl Into<String>) -> Self {
        InvalidArgumentError {
            message: message.into(),
        }
    }
}

impl Error {
    /// Short name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Layout(_) => "layout",
            Error::Bounds(_) => "bounds",
            Error::UseAfterFree(_) => "use-after-free",
            Error::InvalidArgument(_) => "invalid-argument",
        }
    }

    /// Whether the caller can retry with corrected input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Bounds(_))
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::Layout(err) => {
                let mut diag = Diagnostic::error(err.to_string());
                match err {
                    LayoutError::UnsupportedWidth { .. } => {
                        diag = diag
                            .with_context("integers are 1, 2, 4 or 8 bytes; floats are 4 or 8")
                            .with_suggestion("Declare the field with a supported C type");
                    }
                    LayoutError::UnknownGroup { group } => {
                        diag = diag.with_suggestion(format!(
                            "Declare `{}` before the group that embeds it",
                            group
                        ));
                    }
                    LayoutError::TypeMismatch { declared, .. } => {
                        diag = diag.with_suggestion(format!("Access the field as {}", declared));
                    }
                    LayoutError::UnknownField { group, .. } => {
                        diag = diag.with_suggestion(format!(
                            "Run `harbour-layout show` to list the fields of `{}`",
                            group
                        ));
                    }
                    _ => {}
                }
                diag
            }
            Error::Bounds(err) => Diagnostic::error(err.to_string())
                .with_suggestion("Check the element index against the allocated count"),
            Error::UseAfterFree(err) => Diagnostic::error(err.to_string())
                .with_context("regions are only valid while their scope is open"),
            Error::InvalidArgument(err) => Diagnostic::error(err.to_string()),
        }
    }
}
