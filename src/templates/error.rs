//! Template error definitions.

use thiserror::Error;

/// Errors raised while building or rendering the template namespace.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The glob pattern itself is malformed.
    #[error("invalid template pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A matched path could not be read while expanding the pattern.
    #[error("cannot read template path: {0}")]
    Glob(#[from] glob::GlobError),

    /// The pattern is valid but matched no file.
    #[error("pattern matches no files: {0}")]
    NoMatch(String),

    /// A template file failed to parse.
    #[error("template parse failed for {pattern}: {detail}")]
    Parse { pattern: String, detail: String },

    /// No template with that name in the namespace.
    #[error("no such template: {0}")]
    NotFound(String),

    /// Evaluation failed (missing variable, bad filter, sink I/O).
    #[error("template {name} failed to render: {detail}")]
    Render { name: String, detail: String },
}

/// Flatten a Tera error and its causes into one line.
///
/// Tera's top-level message only names the template; the useful part
/// ("Variable `x` not found") sits further down the source chain.
pub(crate) fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
