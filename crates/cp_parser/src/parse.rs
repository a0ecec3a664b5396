use cp_ast::CpSyntax;
use swc_common::{
    comments::SingleThreadedComments, sync::Lrc, FileName, SourceFile, SourceMap, Spanned,
};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax};

use crate::preprocess::{self, Preprocessed};

/// Result of parsing a source file.
pub struct ParseResult {
    pub module: swc_ecma_ast::Module,
    pub comments: SingleThreadedComments,
    pub source_map: Lrc<SourceMap>,
    /// The file holding [`Preprocessed::source`]; spans in `module` point into it.
    pub source_file: Lrc<SourceFile>,
    pub preprocessed: Preprocessed,
}

/// Source text that SWC rejected.
///
/// Lines match the input text. Columns are measured on the preprocessed
/// text, so they can drift on a line that also holds a comprehension.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct ParseError {
    pub file: String,
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
    pub message: String,
}

impl ParseError {
    fn from_swc(source_map: &SourceMap, filename: &str, err: &swc_ecma_parser::error::Error) -> Self {
        let span = err.span();
        let (line, column) = if span.is_dummy() {
            (1, 1)
        } else {
            let loc = source_map.lookup_char_pos(span.lo);
            (loc.line, loc.col_display + 1)
        };
        Self {
            file: filename.to_string(),
            line,
            column,
            message: err.kind().msg().to_string(),
        }
    }
}

/// Parse a source string, accepting array comprehension syntax.
///
/// 1. Preprocess: rewrite `[for (x of xs) ...]` to marker calls.
/// 2. Parse: feed the preprocessed text to the standard SWC parser.
///
/// Errors the parser recovers from are still reported as failures.
pub fn parse_comprehensions(
    source: &str,
    filename: &str,
    syntax: &CpSyntax,
) -> Result<ParseResult, ParseError> {
    let preprocessed = preprocess::preprocess(source, syntax);
    tracing::debug!(
        filename,
        comprehensions = preprocessed.sites.len(),
        "preprocessed source"
    );

    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Real(filename.into())),
        preprocessed.source.clone(),
    );

    let comments = SingleThreadedComments::default();

    let parser_syntax = if syntax.typescript {
        Syntax::Typescript(TsSyntax {
            tsx: syntax.jsx,
            decorators: true,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: syntax.jsx,
            decorators: true,
            ..Default::default()
        })
    };

    let mut recovered = Vec::new();
    let module = swc_ecma_parser::parse_file_as_module(
        &source_file,
        parser_syntax,
        EsVersion::latest(),
        Some(&comments),
        &mut recovered,
    )
    .map_err(|err| ParseError::from_swc(&source_map, filename, &err))?;

    if let Some(err) = recovered.first() {
        return Err(ParseError::from_swc(&source_map, filename, err));
    }

    Ok(ParseResult {
        module,
        comments,
        source_map,
        source_file,
        preprocessed,
    })
}
