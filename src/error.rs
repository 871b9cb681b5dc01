use thiserror::Error;

/// Errors surfaced by the synthesis pipeline.
///
/// Precondition violations (`ExpectedNnf`, `ExpectedXnf`, `NotInClosure`) are
/// unrecoverable for the current synthesis call: the computation is
/// deterministic given its inputs, so retrying cannot help, and masking them
/// could hide an unsound formula/diagram mismatch.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A rewriting pass received a formula that is not in negation normal form.
    #[error("expected a formula in NNF")]
    ExpectedNnf,

    /// The compiler received a formula that is not in next normal form.
    #[error("expected a formula in XNF")]
    ExpectedXnf,

    /// A closure lookup was attempted for a formula that was never registered.
    #[error("formula is not in the closure")]
    NotInClosure,

    /// The formula mentions a proposition that the partition does not declare.
    #[error("variable '{0}' is not declared in the partition")]
    UndeclaredVariable(String),

    /// The partition file is malformed.
    #[error("partition line {line}: {msg}")]
    Partition { line: usize, msg: String },

    /// The formula text is malformed.
    #[error("parse error at position {pos}: {msg}")]
    Parse { pos: usize, msg: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
