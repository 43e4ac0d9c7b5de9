//! Parse error type with code-frame rendering.

use std::fmt;

/// First syntax violation found in a script.
///
/// Line and column are 1-based; columns count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Line of the offending token
    pub line: usize,
    /// Column of the offending token
    pub column: usize,
    /// What went wrong
    pub message: String,
    /// How to fix it, when the expected token is known
    pub suggestion: Option<String>,
}

impl ParseError {
    /// Creates a parse error at a position.
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Sets a suggestion for fixing the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Renders the error with the surrounding source lines and a caret under
    /// the offending column.
    ///
    /// ```text
    /// error: expected ')' but found end of input
    ///  --> 1:12
    ///   |
    /// 1 | map("A","B"
    ///   |            ^
    ///   = help: add a closing parenthesis
    /// ```
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        self.render_frame(source, None)
    }

    /// Like [`ParseError::render`], with the file name in the location line
    /// (`--> remap.rhai:1:12`).
    #[must_use]
    pub fn render_named(&self, source: &str, name: &str) -> String {
        self.render_frame(source, Some(name))
    }

    fn render_frame(&self, source: &str, name: Option<&str>) -> String {
        use std::fmt::Write as _;

        let lines: Vec<&str> = source.lines().collect();
        let first = self.line.saturating_sub(1).max(1);
        let last = (self.line + 1).min(lines.len().max(self.line));
        let gutter = last.to_string().len();

        let mut out = String::new();
        let _ = writeln!(out, "error: {}", self.message);
        let origin = name.map(|n| format!("{n}:")).unwrap_or_default();
        let _ = writeln!(out, "{:gutter$}--> {origin}{}:{}", "", self.line, self.column);
        let _ = writeln!(out, "{:gutter$} |", "");

        for number in first..=last {
            let text = lines.get(number - 1).copied().unwrap_or("");
            if number != self.line && number > lines.len() {
                continue;
            }
            let _ = writeln!(out, "{number:>gutter$} | {text}");
            if number == self.line {
                let pad = " ".repeat(self.column.saturating_sub(1));
                let _ = writeln!(out, "{:gutter$} | {pad}^", "");
            }
        }

        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(out, "{:gutter$} = help: {suggestion}", "");
        }
        out
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position_and_hint() {
        let err = ParseError::new(3, 7, "expected ';'").with_suggestion("add a semicolon");
        assert_eq!(err.to_string(), "3:7: expected ';' (add a semicolon)");
    }

    #[test]
    fn test_render_points_at_column() {
        let source = "map(\"A\", \"B\");\nmap(\"C\" \"D\");\nmap(\"E\", \"F\");\n";
        let err = ParseError::new(2, 9, "expected ','").with_suggestion("separate arguments with a comma");
        let frame = err.render(source);

        assert!(frame.contains("--> 2:9"));
        assert!(frame.contains("1 | map(\"A\", \"B\");"));
        assert!(frame.contains("2 | map(\"C\" \"D\");"));
        assert!(frame.contains("3 | map(\"E\", \"F\");"));
        assert!(frame.contains("  |         ^"));
        assert!(frame.contains("= help: separate arguments with a comma"));
    }

    #[test]
    fn test_render_named() {
        let err = ParseError::new(1, 4, "expected '('");
        assert!(err.render_named("map", "remap.rhai").contains("--> remap.rhai:1:4"));
    }

    #[test]
    fn test_render_past_last_line() {
        let err = ParseError::new(2, 1, "expected '}'");
        let frame = err.render("device(\"x\") {\n");
        assert!(frame.contains("2 | "));
        assert!(frame.contains("  | ^"));
    }
}
