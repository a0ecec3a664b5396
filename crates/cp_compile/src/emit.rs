//! Code generation for compiled output.

use std::collections::HashMap;

use cp_desugar::Rewritten;
use cp_parser::ParseResult;
use swc_common::{comments::Comments, source_map::DefaultSourceMapGenConfig, sync::Lrc, SourceMap};
use swc_ecma_ast::{EsVersion, Expr};
use swc_ecma_codegen::{
    text_writer::{JsWriter, WriteJs},
    Config, Emitter, Node,
};

use crate::error::CompileError;
use crate::indent::Indent;

fn config() -> Config {
    Config::default().with_target(EsVersion::latest())
}

fn into_string(buf: Vec<u8>) -> Result<String, CompileError> {
    String::from_utf8(buf).map_err(|err| CompileError::emit(err.to_string()))
}

/// Print the whole module, with comments, and a JSON source map when
/// `map_name` is set.
pub(crate) fn emit_module(
    parsed: &ParseResult,
    indent: Indent,
    map_name: Option<&str>,
) -> Result<(String, Option<String>), CompileError> {
    let mut buf = Vec::new();
    let mut mappings = map_name.map(|_| Vec::new());
    {
        let mut writer = JsWriter::new(
            parsed.source_map.clone(),
            "\n",
            &mut buf,
            mappings.as_mut(),
        );
        writer.set_indent_str(indent.as_static_str());
        let mut emitter = Emitter {
            cfg: config(),
            cm: parsed.source_map.clone(),
            comments: Some(&parsed.comments),
            wr: writer,
        };
        parsed.module.emit_with(&mut emitter)?;
    }
    let code = into_string(buf)?;

    let map = match (map_name, mappings) {
        (Some(name), Some(mappings)) => {
            tracing::debug!(map = name, mappings = mappings.len(), "building source map");
            let srcmap =
                parsed
                    .source_map
                    .build_source_map(&mappings, None, DefaultSourceMapGenConfig);
            let mut json = Vec::new();
            srcmap
                .to_writer(&mut json)
                .map_err(|err| CompileError::emit(format!("failed to serialize source map: {err}")))?;
            Some(into_string(json)?)
        }
        _ => None,
    };

    Ok((code, map))
}

/// Print `expr` as if it started on a line indented `level` times.
///
/// The first line carries no indentation; it continues whatever text
/// precedes it.
pub(crate) fn emit_expr(
    cm: Lrc<SourceMap>,
    comments: Option<&dyn Comments>,
    expr: &Expr,
    indent: Indent,
    level: usize,
) -> Result<String, CompileError> {
    let mut buf = Vec::new();
    {
        let mut writer = JsWriter::new(cm.clone(), "\n", &mut buf, None);
        writer.set_indent_str(indent.as_static_str());
        for _ in 0..level {
            writer.increase_indent()?;
        }
        let mut emitter = Emitter {
            cfg: config(),
            cm,
            comments,
            wr: writer,
        };
        expr.emit_with(&mut emitter)?;
    }

    let printed = into_string(buf)?;
    let prefix = indent.as_static_str().repeat(level);
    Ok(printed
        .strip_prefix(prefix.as_str())
        .map(str::to_string)
        .unwrap_or(printed))
}

/// Copy `source`, replacing each top-level comprehension with its printed
/// replacement.
pub(crate) fn splice(
    source: &str,
    parsed: &ParseResult,
    replacements: &[Rewritten],
    indent: Indent,
) -> Result<String, CompileError> {
    let by_offset: HashMap<usize, &Rewritten> = replacements
        .iter()
        .map(|rewritten| {
            let offset = (rewritten.span.lo - parsed.source_file.start_pos).0 as usize;
            (offset, rewritten)
        })
        .collect();

    let mut out = String::with_capacity(source.len() * 2);
    let mut cursor = 0;

    for site in &parsed.preprocessed.sites {
        let Some(rewritten) = by_offset.get(&site.rewritten.start) else {
            return Err(CompileError::emit(format!(
                "comprehension at byte {} was not rewritten",
                site.original.start
            )));
        };

        // The surrounding text keeps its own comments.
        parsed.comments.take_leading(rewritten.span.lo);
        parsed.comments.take_trailing(rewritten.span.hi);

        let level = indent.level_at(source, site.original.start);
        let printed = emit_expr(
            parsed.source_map.clone(),
            Some(&parsed.comments),
            &rewritten.replacement,
            indent,
            level,
        )?;
        tracing::trace!(at = site.original.start, level, "spliced comprehension");

        out.push_str(&source[cursor..site.original.start]);
        out.push_str(&printed);
        cursor = site.original.end;
    }
    out.push_str(&source[cursor..]);

    Ok(out)
}
