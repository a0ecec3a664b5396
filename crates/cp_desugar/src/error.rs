use cp_ast::MarkerError;
use swc_common::Span;

/// Why a module could not be desugared.
///
/// Any error aborts the whole transform; no partially rewritten tree is
/// handed back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DesugarError {
    #[error("invalid comprehension: {reason}")]
    InvalidComprehension { span: Span, reason: String },

    #[error("no free name for temporary `{base}` after {attempts} attempts")]
    NameCollisionExhausted { base: String, attempts: usize },
}

impl DesugarError {
    pub(crate) fn invalid(span: Span, reason: impl Into<String>) -> Self {
        Self::InvalidComprehension {
            span,
            reason: reason.into(),
        }
    }

    /// Source position of the offending comprehension, if there is one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::InvalidComprehension { span, .. } => Some(*span),
            Self::NameCollisionExhausted { .. } => None,
        }
    }
}

impl From<MarkerError> for DesugarError {
    fn from(err: MarkerError) -> Self {
        Self::InvalidComprehension {
            span: err.span,
            reason: err.reason,
        }
    }
}
