//! Rewrites `[for (x of xs) ... body]` into marker calls.
//!
//! ```text
//! [for (x of xs) for (y of ys) if (x < y) x * y]
//! __comprehension__([[x, (xs)], [y, (ys)]], (x < y), (x * y))
//! ```
//!
//! Each source, filter, and body is copied verbatim (after recursively
//! rewriting any comprehension nested inside it) and wrapped in parentheses.
//! Line breaks from the dropped `for`/`of`/`if` syntax are re-emitted inside
//! the marker so every line after a comprehension keeps its line number.

use std::ops::Range;

use cp_ast::COMPREHENSION_MARKER;

use super::util::{
    char_offset_to_byte, is_ident_start, keyword_at, scan_word, skip_non_code, skip_regex,
    skip_trivia, ExprState, HandleResult, Region, TemplateState,
};
use super::{ComprehensionSite, Preprocessed};

struct FoundBlock {
    binding: Range<usize>,
    source: Range<usize>,
}

/// A comprehension recognised in the character stream. All ranges are
/// character indices.
struct Found {
    blocks: Vec<FoundBlock>,
    filter: Option<Range<usize>>,
    body: Range<usize>,
    /// Index just past the closing `]`.
    end: usize,
}

/// Rewrite every comprehension in `source`.
pub fn rewrite_comprehensions(source: &str) -> Preprocessed {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut sites = Vec::new();
    rewrite_range(&chars, 0..chars.len(), &mut out, Some(&mut sites));
    Preprocessed { source: out, sites }
}

/// Copy `range` to `out`, replacing comprehensions with marker calls.
///
/// Only top-level comprehensions are recorded in `sites`; nested ones are
/// rewritten as part of their enclosing marker.
fn rewrite_range(
    chars: &[char],
    range: Range<usize>,
    out: &mut String,
    mut sites: Option<&mut Vec<ComprehensionSite>>,
) {
    let mut templates = TemplateState::new();
    let mut state = ExprState::new();
    let mut i = range.start;

    while i < range.end {
        if let HandleResult::Skip(n) = templates.handle_char(chars, i) {
            let next = (i + n).min(range.end);
            out.extend(chars[i..next].iter());
            // `${` opens an interpolation, anything else ends an operand.
            state.set_expr_start(chars[next - 1] == '{');
            i = next;
            continue;
        }

        if let Some((next, region)) = skip_non_code(chars, i) {
            let next = next.min(range.end);
            out.extend(chars[i..next].iter());
            if region == Region::String {
                state.set_expr_start(false);
            }
            i = next;
            continue;
        }

        let c = chars[i];
        if c == '/' && state.expr_start() {
            let next = skip_regex(chars, i).min(range.end);
            out.extend(chars[i..next].iter());
            state.set_expr_start(false);
            i = next;
            continue;
        }

        if is_ident_start(c) || c.is_ascii_digit() {
            let end = scan_word(chars, i).max(i + 1);
            let word: String = chars[i..end].iter().collect();
            state.word(&word);
            out.push_str(&word);
            i = end;
            continue;
        }

        if c == '[' && state.expr_start() {
            if let Some(found) = match_comprehension(chars, i, range.end) {
                let rewritten_start = out.len();
                emit_marker(chars, i, &found, out);
                if let Some(sites) = sites.as_mut() {
                    sites.push(ComprehensionSite {
                        original: char_offset_to_byte(chars, i)..char_offset_to_byte(chars, found.end),
                        rewritten: rewritten_start..out.len(),
                    });
                }
                i = found.end;
                state.set_expr_start(false);
                continue;
            }
        }

        out.push(c);
        if !c.is_whitespace() {
            state.punct(c);
        }
        i += 1;
    }
}

/// Try to read a comprehension whose `[` is at `open`.
fn match_comprehension(chars: &[char], open: usize, end: usize) -> Option<Found> {
    let mut j = skip_trivia(chars, open + 1);
    if !keyword_at(chars, j, "for") {
        return None;
    }

    let mut blocks = Vec::new();
    loop {
        j = skip_trivia(chars, j + "for".len());
        if chars.get(j) != Some(&'(') {
            return None;
        }
        j = skip_trivia(chars, j + 1);
        if !chars.get(j).is_some_and(|&c| is_ident_start(c)) {
            return None;
        }
        let binding = j..scan_word(chars, j);
        j = skip_trivia(chars, binding.end);
        if !keyword_at(chars, j, "of") {
            return None;
        }
        let source_start = j + "of".len();
        let source_end = find_closing(chars, source_start, end, ')')?;
        blocks.push(FoundBlock {
            binding,
            source: trim(chars, source_start..source_end),
        });

        j = skip_trivia(chars, source_end + 1);
        if !keyword_at(chars, j, "for") {
            break;
        }
    }

    let mut filter = None;
    if keyword_at(chars, j, "if") {
        let open_paren = skip_trivia(chars, j + "if".len());
        if chars.get(open_paren) != Some(&'(') {
            return None;
        }
        let filter_end = find_closing(chars, open_paren + 1, end, ')')?;
        filter = Some(trim(chars, open_paren + 1..filter_end));

        j = skip_trivia(chars, filter_end + 1);
        // Only a single trailing filter is supported.
        if keyword_at(chars, j, "for") || keyword_at(chars, j, "if") {
            return None;
        }
    }

    let body_end = find_closing(chars, j, end, ']')?;
    let body = trim(chars, j..body_end);
    if body.is_empty() {
        return None;
    }

    Some(Found {
        blocks,
        filter,
        body,
        end: body_end + 1,
    })
}

/// Index of the `close` character that ends the bracketed region starting
/// at `from`, skipping nested brackets, strings, comments, regular
/// expressions and templates.
fn find_closing(chars: &[char], from: usize, end: usize, close: char) -> Option<usize> {
    let mut templates = TemplateState::new();
    let mut state = ExprState::new();
    let mut depth = 0usize;
    let mut i = from;

    while i < end {
        if let HandleResult::Skip(n) = templates.handle_char(chars, i) {
            i += n;
            state.set_expr_start(chars[i - 1] == '{');
            continue;
        }
        if let Some((next, region)) = skip_non_code(chars, i) {
            i = next;
            if region == Region::String {
                state.set_expr_start(false);
            }
            continue;
        }

        let c = chars[i];
        if c == '/' && state.expr_start() {
            i = skip_regex(chars, i);
            state.set_expr_start(false);
            continue;
        }
        if is_ident_start(c) || c.is_ascii_digit() {
            let word_end = scan_word(chars, i).max(i + 1);
            let word: String = chars[i..word_end].iter().collect();
            state.word(&word);
            i = word_end;
            continue;
        }

        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    return (c == close).then_some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
        if !c.is_whitespace() {
            state.punct(c);
        }
        i += 1;
    }

    None
}

fn trim(chars: &[char], range: Range<usize>) -> Range<usize> {
    let mut start = range.start;
    let mut end = range.end;
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    start..end
}

fn push_line_breaks(out: &mut String, gap: &[char]) {
    for _ in gap.iter().filter(|&&c| c == '\n') {
        out.push('\n');
    }
}

fn emit_marker(chars: &[char], open: usize, found: &Found, out: &mut String) {
    out.push_str(COMPREHENSION_MARKER);
    out.push_str("([");

    let mut cursor = open;
    for (k, block) in found.blocks.iter().enumerate() {
        if k > 0 {
            out.push_str(", ");
        }
        out.push('[');
        out.extend(chars[block.binding.clone()].iter());
        out.push_str(", (");
        push_line_breaks(out, &chars[cursor..block.source.start]);
        rewrite_range(chars, block.source.clone(), out, None);
        out.push_str(")]");
        cursor = block.source.end;
    }
    out.push(']');

    if let Some(filter) = &found.filter {
        out.push_str(", (");
        push_line_breaks(out, &chars[cursor..filter.start]);
        rewrite_range(chars, filter.clone(), out, None);
        out.push(')');
        cursor = filter.end;
    }

    out.push_str(", (");
    push_line_breaks(out, &chars[cursor..found.body.start]);
    rewrite_range(chars, found.body.clone(), out, None);
    push_line_breaks(out, &chars[found.body.end..found.end]);
    out.push_str("))");
}
