use cp_ast::CpSyntax;
use cp_desugar::{DesugarOptions, ReceiverForwarding};
use serde::{Deserialize, Serialize};

/// How the output text is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    /// Keep the input text and splice in printed replacements.
    #[default]
    Preserve,
    /// Print the whole module again.
    Reprint,
}

/// Options for [`crate::compile`].
///
/// Deserializes from camelCase JSON; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Name used in diagnostics and as the source map's `sources` entry.
    pub source_file_name: String,
    /// Produce a source map with this file name. Implies [`PrintMode::Reprint`].
    pub source_map_name: Option<String>,
    /// Width of one indentation level, from 1 to [`Indent::MAX_WIDTH`];
    /// inferred from the input when unset.
    ///
    /// [`Indent::MAX_WIDTH`]: crate::Indent::MAX_WIDTH
    pub indent_width: Option<usize>,
    pub print_mode: PrintMode,
    pub forward_receiver: ReceiverForwarding,
    /// Dialect of the input; derived from `source_file_name` when unset.
    pub syntax: Option<CpSyntax>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            source_file_name: "input.js".to_string(),
            source_map_name: None,
            indent_width: None,
            print_mode: PrintMode::default(),
            forward_receiver: ReceiverForwarding::default(),
            syntax: None,
        }
    }
}

impl CompileOptions {
    pub fn new(source_file_name: impl Into<String>) -> Self {
        Self {
            source_file_name: source_file_name.into(),
            ..Self::default()
        }
    }

    pub fn syntax(&self) -> CpSyntax {
        self.syntax
            .clone()
            .unwrap_or_else(|| CpSyntax::for_file(&self.source_file_name))
    }

    pub fn desugar_options(&self) -> DesugarOptions {
        DesugarOptions {
            forward_receiver: self.forward_receiver,
        }
    }

    pub(crate) fn effective_print_mode(&self) -> PrintMode {
        if self.source_map_name.is_some() {
            PrintMode::Reprint
        } else {
            self.print_mode
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let options: CompileOptions = serde_json::from_str(
            r#"{ "sourceFileName": "app.ts", "indentWidth": 4, "forwardReceiver": "always" }"#,
        )
        .unwrap();
        assert_eq!(
            options,
            CompileOptions {
                source_file_name: "app.ts".into(),
                indent_width: Some(4),
                forward_receiver: ReceiverForwarding::Always,
                ..CompileOptions::default()
            }
        );
        assert!(options.syntax().typescript);
    }

    #[test]
    fn explicit_syntax_wins_over_extension() {
        let options: CompileOptions =
            serde_json::from_str(r#"{ "sourceFileName": "a.js", "syntax": { "typescript": true } }"#)
                .unwrap();
        let syntax = options.syntax();
        assert!(syntax.typescript);
        assert!(syntax.comprehensions);
    }

    #[test]
    fn source_map_forces_reprint() {
        let mut options = CompileOptions::new("a.js");
        assert_eq!(options.effective_print_mode(), PrintMode::Preserve);
        options.source_map_name = Some("a.js.map".into());
        assert_eq!(options.effective_print_mode(), PrintMode::Reprint);
    }
}
