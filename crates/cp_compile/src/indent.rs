//! Indentation used for generated code.

const SPACES: &str = "                ";

/// One level of indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Tabs,
    /// Printed at most [`Indent::MAX_WIDTH`] columns wide.
    Spaces(usize),
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

impl Indent {
    /// Widest explicit indentation accepted by `compile`.
    pub const MAX_WIDTH: usize = SPACES.len();

    /// Infer the indentation style of `source`.
    pub fn detect(source: &str) -> Self {
        let (mut tabs, mut spaces) = (0usize, 0usize);
        for line in source.lines() {
            match line.chars().next() {
                Some('\t') => tabs += 1,
                Some(' ') => spaces += 1,
                _ => {}
            }
        }

        if tabs > spaces {
            Indent::Tabs
        } else {
            Indent::Spaces(guess_width(source))
        }
    }

    pub fn as_static_str(self) -> &'static str {
        match self {
            Indent::Tabs => "\t",
            Indent::Spaces(width) => &SPACES[..width.clamp(1, SPACES.len())],
        }
    }

    /// Indentation level of the line containing byte offset `at`.
    pub fn level_at(self, source: &str, at: usize) -> usize {
        let line_start = source[..at].rfind('\n').map_or(0, |i| i + 1);
        let leading = &source[line_start..];
        match self {
            Indent::Tabs => leading.chars().take_while(|&c| c == '\t').count(),
            Indent::Spaces(_) => {
                let columns = leading.chars().take_while(|&c| c == ' ').count();
                columns / self.as_static_str().len()
            }
        }
    }
}

/// The most frequent nonzero change in leading whitespace between
/// consecutive lines, preferring the smaller width on a tie. Defaults to 2.
pub fn guess_width(source: &str) -> usize {
    let mut counts: Vec<usize> = Vec::new();
    let mut last = 0usize;

    for line in source.split('\n') {
        let indent = line.chars().take_while(|c| c.is_whitespace()).count();
        let delta = indent.abs_diff(last);
        if counts.len() <= delta {
            counts.resize(delta + 1, 0);
        }
        counts[delta] += 1;
        last = indent;
    }

    let mut best = (0, 2);
    for (width, &count) in counts.iter().enumerate().skip(1) {
        if count > best.0 {
            best = (count, width);
        }
    }
    best.1
}
