use std::io;

use cp_desugar::DesugarError;
use cp_parser::{ParseError, ParseResult};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{file}:{line}:{column}: invalid comprehension: {reason}")]
    InvalidComprehension {
        file: String,
        line: usize,
        column: usize,
        reason: String,
    },

    #[error("no free name for temporary `{base}` after {attempts} attempts")]
    NameCollisionExhausted { base: String, attempts: usize },

    #[error("indent width {width} is out of range 1..={max}")]
    InvalidIndentWidth { width: usize, max: usize },

    #[error("failed to emit code")]
    Emit(#[from] io::Error),
}

impl CompileError {
    /// Attach a file position to a desugaring failure.
    pub(crate) fn from_desugar(err: DesugarError, parsed: &ParseResult, file: &str) -> Self {
        match err {
            DesugarError::InvalidComprehension { span, reason } => {
                let (line, column) = if span.is_dummy() {
                    (1, 1)
                } else {
                    let loc = parsed.source_map.lookup_char_pos(span.lo);
                    (loc.line, loc.col_display + 1)
                };
                Self::InvalidComprehension {
                    file: file.to_string(),
                    line,
                    column,
                    reason,
                }
            }
            DesugarError::NameCollisionExhausted { base, attempts } => {
                Self::NameCollisionExhausted { base, attempts }
            }
        }
    }

    pub(crate) fn emit(message: impl Into<String>) -> Self {
        Self::Emit(io::Error::new(io::ErrorKind::InvalidData, message.into()))
    }
}
