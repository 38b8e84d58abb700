//! Error types for template rendering.

use thiserror::Error;

/// Errors that abort a render call.
///
/// Every variant is fatal to the template being rendered; no partially
/// substituted output is ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A referenced `env.NAME` is not present in the bindings.
    #[error("environment variable '{name}' is not set")]
    MissingVariable {
        /// The variable name after the `env.` prefix.
        name: String,
    },

    /// A `builtin.NAME` placeholder names an unknown builtin.
    #[error("unknown builtin '{name}' (expected CURR_DATE, CURR_TIME or CURR_DATETIME)")]
    UnknownBuiltin {
        /// The builtin name after the `builtin.` prefix.
        name: String,
    },

    /// A `json.*`/`api.*` placeholder was used without a configured JSON source.
    #[error("'{namespace}' placeholder used but no JSON source is configured")]
    MissingJsonSource {
        /// The namespace that triggered the lookup.
        namespace: String,
    },

    /// The JSON source was unreachable, returned a non-2xx status, or was not JSON.
    #[error("failed to load JSON context from {url}: {message}")]
    ContextFetchError {
        /// The URL that was requested.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// A path is syntactically malformed.
    #[error("invalid path '{path}': {message}")]
    InvalidPath {
        /// The offending path text.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// A path segment or attribute has no corresponding key or index.
    #[error("'{segment}' not found while evaluating {context}")]
    PathNotFound {
        /// The key or index that was missing.
        segment: String,
        /// The path or operation being evaluated.
        context: String,
    },

    /// An operation or path segment was applied to a value of the wrong shape.
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path or operation being evaluated.
        context: String,
        /// The shape that was required.
        expected: &'static str,
        /// The shape that was found.
        found: &'static str,
    },

    /// `[RANDOM]` or `random()` was applied to a zero-length list.
    #[error("cannot pick a random element from an empty list in {context}")]
    EmptyArray {
        /// The path or operation being evaluated.
        context: String,
    },

    /// An operation argument is missing, malformed, or semantically invalid.
    #[error("invalid argument for '{operation}': {message}")]
    InvalidArgument {
        /// The operation name as written.
        operation: String,
        /// What is wrong with the argument.
        message: String,
    },

    /// An operation name is not in the fixed operation set.
    #[error("unknown operation '{name}'")]
    UnknownOperation {
        /// The operation name as written, including any `each:` qualifier.
        name: String,
    },
}

impl RenderError {
    pub(crate) fn type_mismatch(
        context: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    pub(crate) fn invalid_argument(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
