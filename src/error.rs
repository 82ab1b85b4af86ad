use thiserror::Error;

/// The single error type raised by parsing.
///
/// All parse-time failures are fatal and first-error: the parser never
/// recovers or returns a partial AST. Evaluation does not produce errors at
/// all; a path that fails to resolve against a particular element instance is
/// simply absent (treated as false / empty).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectError {
    /// The expression text does not match the grammar (including characters
    /// outside any token class).
    #[error("syntax error in '{0}': {1}")]
    Syntax(String, String),

    /// A path step names a child the schema does not declare at that point,
    /// references an undeclared namespace alias, or extends past an
    /// attribute step.
    #[error("invalid path: {0}")]
    Path(String),

    /// A literal's lexical form does not match its declared type, e.g.
    /// `xs:date("not-a-date")`.
    #[error("invalid literal: {0}")]
    Literal(String),
}
