//! Character-level scanning helpers shared by the comprehension pass.

/// What a non-code region turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Region {
    Comment,
    String,
}

/// Skip a comment or a quoted string starting at `i`.
///
/// Template literals are not handled here; their `${...}` parts contain code,
/// so callers track them with [`TemplateState`].
///
/// Returns the index just past the region, clamped to `chars.len()`, or
/// `None` when `i` does not start a comment or string.
pub(super) fn skip_non_code(chars: &[char], i: usize) -> Option<(usize, Region)> {
    let at = |k: usize| chars.get(k).copied();

    match (at(i)?, at(i + 1)) {
        ('/', Some('/')) => {
            let mut j = i + 2;
            while j < chars.len() && chars[j] != '\n' {
                j += 1;
            }
            Some((j, Region::Comment))
        }
        ('/', Some('*')) => {
            let mut j = i + 2;
            while j + 1 < chars.len() {
                if chars[j] == '*' && chars[j + 1] == '/' {
                    return Some((j + 2, Region::Comment));
                }
                j += 1;
            }
            Some((chars.len(), Region::Comment))
        }
        (quote @ ('"' | '\''), _) => {
            let mut j = i + 1;
            while j < chars.len() && chars[j] != quote {
                if chars[j] == '\\' {
                    j += 1;
                }
                j += 1;
            }
            Some(((j + 1).min(chars.len()), Region::String))
        }
        _ => None,
    }
}

/// Skip a regular expression literal whose opening `/` is at `i`.
///
/// Callers decide whether a `/` starts a literal or divides. Returns the
/// index just past the flags, or the index of the line break when the
/// literal is unterminated.
pub(super) fn skip_regex(chars: &[char], i: usize) -> usize {
    let mut j = i + 1;
    let mut in_class = false;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 1,
            '\n' => return j,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                return scan_word(chars, j + 1);
            }
            _ => {}
        }
        j += 1;
    }
    chars.len()
}

/// Skip whitespace and comments starting at `i`.
pub(super) fn skip_trivia(chars: &[char], mut i: usize) -> usize {
    loop {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        match skip_non_code(chars, i) {
            Some((next, Region::Comment)) => i = next,
            _ => return i,
        }
    }
}

pub(super) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(super) fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// End index of the identifier-like word starting at `i`.
pub(super) fn scan_word(chars: &[char], i: usize) -> usize {
    let mut j = i;
    while j < chars.len() && is_ident_part(chars[j]) {
        j += 1;
    }
    j
}

/// Returns `true` if the word `kw` starts at `i` and is not a prefix of a
/// longer identifier.
pub(super) fn keyword_at(chars: &[char], i: usize, kw: &str) -> bool {
    let len = kw.chars().count();
    i + len <= chars.len()
        && chars[i..i + len].iter().copied().eq(kw.chars())
        && !chars.get(i + len).is_some_and(|&c| is_ident_part(c))
}

/// Keywords after which an expression may start.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "void",
    "delete",
    "throw",
    "in",
    "of",
    "instanceof",
    "yield",
    "await",
    "case",
    "do",
    "else",
    "extends",
    "default",
    "new",
];

/// Statement keywords whose parenthesised header is followed by a statement.
const HEADER_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Tracks whether an expression may start at the next significant token.
///
/// That decides whether `[` opens an array rather than indexing, and whether
/// `/` opens a regular expression rather than dividing.
#[derive(Debug)]
pub(super) struct ExprState {
    expr_start: bool,
    after_header_keyword: bool,
    /// One entry per open `(`: whether it opened a statement header.
    parens: Vec<bool>,
}

impl Default for ExprState {
    fn default() -> Self {
        Self {
            expr_start: true,
            after_header_keyword: false,
            parens: Vec::new(),
        }
    }
}

impl ExprState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr_start(&self) -> bool {
        self.expr_start
    }

    pub fn set_expr_start(&mut self, expr_start: bool) {
        self.expr_start = expr_start;
        self.after_header_keyword = false;
    }

    /// An identifier, keyword or number was read.
    pub fn word(&mut self, word: &str) {
        let is_number = word.starts_with(|c: char| c.is_ascii_digit());
        self.expr_start = !is_number && EXPRESSION_KEYWORDS.contains(&word);
        self.after_header_keyword = !is_number && HEADER_KEYWORDS.contains(&word);
    }

    /// A punctuator was read.
    pub fn punct(&mut self, c: char) {
        self.expr_start = match c {
            '(' => {
                self.parens.push(self.after_header_keyword);
                true
            }
            ')' => self.parens.pop().unwrap_or(false),
            ']' => false,
            // Usually the end of a block.
            '}' => true,
            _ => true,
        };
        self.after_header_keyword = false;
    }
}

/// Tracks template literal nesting while scanning.
///
/// Each stack entry is one open template literal; the value is the brace
/// depth inside its current `${...}` interpolation, `0` meaning the scanner
/// is in literal text.
#[derive(Default)]
pub(super) struct TemplateState {
    stack: Vec<i32>,
}

/// Outcome of feeding one character to [`TemplateState`].
pub(super) enum HandleResult {
    /// Template text or delimiters: copy this many characters verbatim.
    Skip(usize),
    /// Code: the caller should scan this character itself.
    Process,
}

impl TemplateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_char(&mut self, chars: &[char], i: usize) -> HandleResult {
        let Some(top) = self.stack.len().checked_sub(1) else {
            if chars[i] == '`' {
                self.stack.push(0);
                return HandleResult::Skip(1);
            }
            return HandleResult::Process;
        };

        if self.stack[top] == 0 {
            return match chars[i] {
                '\\' if i + 1 < chars.len() => HandleResult::Skip(2),
                '$' if chars.get(i + 1) == Some(&'{') => {
                    self.stack[top] = 1;
                    HandleResult::Skip(2)
                }
                '`' => {
                    self.stack.pop();
                    HandleResult::Skip(1)
                }
                _ => HandleResult::Skip(1),
            };
        }

        match chars[i] {
            '`' => {
                self.stack.push(0);
                HandleResult::Skip(1)
            }
            '{' => {
                self.stack[top] += 1;
                HandleResult::Process
            }
            '}' => {
                self.stack[top] -= 1;
                if self.stack[top] == 0 {
                    HandleResult::Skip(1)
                } else {
                    HandleResult::Process
                }
            }
            _ => HandleResult::Process,
        }
    }
}

/// Convert a character index to a byte offset in UTF-8.
pub(super) fn char_offset_to_byte(chars: &[char], char_idx: usize) -> usize {
    chars[..char_idx].iter().map(|c| c.len_utf8()).sum()
}
