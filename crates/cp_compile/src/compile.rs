use cp_desugar::desugar_module;
use cp_parser::parse_comprehensions;

use crate::emit;
use crate::error::CompileError;
use crate::indent::Indent;
use crate::options::{CompileOptions, PrintMode};

/// Result of [`compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub code: String,
    /// JSON source map, present when `source_map_name` was set.
    pub map: Option<String>,
}

/// Compile `source`, replacing every array comprehension with plain
/// ECMAScript.
///
/// 1. Parse: preprocess comprehension syntax and parse with SWC.
/// 2. Desugar: rewrite each comprehension into an invoked function.
/// 3. Print: splice the replacements into the input text, or print the
///    whole module again (see [`PrintMode`]).
#[tracing::instrument(level = "debug", skip_all, fields(file = %options.source_file_name))]
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let file = options.source_file_name.as_str();
    if let Some(width) = options.indent_width {
        if !(1..=Indent::MAX_WIDTH).contains(&width) {
            return Err(CompileError::InvalidIndentWidth {
                width,
                max: Indent::MAX_WIDTH,
            });
        }
    }
    let mut parsed = parse_comprehensions(source, file, &options.syntax())?;

    let report = desugar_module(&mut parsed.module, &options.desugar_options())
        .map_err(|err| CompileError::from_desugar(err, &parsed, file))?;

    let indent = match options.indent_width {
        Some(width) => Indent::Spaces(width),
        None => Indent::detect(source),
    };
    tracing::debug!(rewritten = report.rewritten, ?indent, "desugared module");

    match options.effective_print_mode() {
        PrintMode::Preserve if report.rewritten == 0 => Ok(CompileOutput {
            code: source.to_string(),
            map: None,
        }),
        PrintMode::Preserve => Ok(CompileOutput {
            code: emit::splice(source, &parsed, &report.top_level, indent)?,
            map: None,
        }),
        PrintMode::Reprint => {
            let (code, map) =
                emit::emit_module(&parsed, indent, options.source_map_name.as_deref())?;
            Ok(CompileOutput { code, map })
        }
    }
}
