//! Whitespace and layout normalization for mapping scripts.
//!
//! The formatter works on tokens rather than on a parsed document, so it can
//! tidy scripts that do not parse yet (only lexing must succeed). It never
//! adds, drops or reorders non-comment tokens, and comments keep their
//! relative order, which is why formatting cannot change the document a later
//! parse produces.

use crate::constants::{DEFAULT_INDENT_WIDTH, DEFAULT_MAX_LINE_LENGTH};
use crate::parser::lexer::{tokenize, Token, TokenKind};
use crate::parser::ParseError;
use serde::{Deserialize, Serialize};

/// Layout options for [`format`] and the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Spaces per nesting level
    pub indent_width: usize,
    /// Statements longer than this are wrapped when they contain a list
    pub max_line_length: usize,
    /// Keep at most one blank line between items (false removes all)
    pub collapse_blank_lines: bool,
    /// Leave end-of-line comments on their line (false moves them below)
    pub keep_comments_in_place: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            collapse_blank_lines: true,
            keep_comments_in_place: true,
        }
    }
}

/// Formats `source`, returning it unchanged if it cannot be tokenized.
#[must_use]
pub fn format(source: &str, options: &FormatOptions) -> String {
    try_format(source, options).unwrap_or_else(|_| source.to_string())
}

/// Formats `source`, failing with the lexical error if it cannot be
/// tokenized.
///
/// # Examples
///
/// ```
/// use mapsync::codegen::{try_format, FormatOptions};
///
/// let out = try_format("device(\"x\"){map( \"A\",\"B\" );}", &FormatOptions::default()).unwrap();
/// assert_eq!(out, "device(\"x\") {\n    map(\"A\", \"B\");\n}\n");
/// ```
pub fn try_format(source: &str, options: &FormatOptions) -> Result<String, ParseError> {
    let tokens = tokenize(source)?;
    Ok(Formatter::new(options).run(&tokens))
}

/// How a group of tokens ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupEnd {
    /// `;` at depth 0
    Statement,
    /// `{` of a block header
    Open,
    /// `}` alone
    Close,
    /// Input ended or a `}` interrupted the statement
    Incomplete,
}

struct Formatter<'o> {
    options: &'o FormatOptions,
    lines: Vec<String>,
    depth: usize,
    /// The last emitted line opened a block
    after_open: bool,
}

impl<'o> Formatter<'o> {
    const fn new(options: &'o FormatOptions) -> Self {
        Self {
            options,
            lines: Vec::new(),
            depth: 0,
            after_open: false,
        }
    }

    fn run(mut self, tokens: &[Token]) -> String {
        let mut idx = 0;
        let mut prev_end_line: Option<usize> = None;

        while idx < tokens.len() {
            let token = &tokens[idx];
            let blank = prev_end_line.is_some_and(|prev| token.line > prev + 1);

            if token.kind.is_comment() {
                self.blank_line(blank, false);
                let line = format!("{}{}", self.indent(), token.kind.text());
                self.push_line(line);
                prev_end_line = Some(token.end_line);
                idx += 1;
                continue;
            }

            // Collect one group: statement, header or closing brace
            let mut group: Vec<&Token> = Vec::new();
            let mut hoisted: Vec<&Token> = Vec::new();
            let mut paren_depth = 0usize;
            let mut end = GroupEnd::Incomplete;
            while idx < tokens.len() {
                let t = &tokens[idx];
                if t.kind.is_comment() {
                    hoisted.push(t);
                    idx += 1;
                    continue;
                }
                if t.kind == TokenKind::RBrace && !group.is_empty() {
                    break;
                }
                group.push(t);
                idx += 1;
                match t.kind {
                    TokenKind::LParen | TokenKind::LBracket => paren_depth += 1,
                    TokenKind::RParen | TokenKind::RBracket => {
                        paren_depth = paren_depth.saturating_sub(1);
                    }
                    TokenKind::Semicolon if paren_depth == 0 => {
                        end = GroupEnd::Statement;
                        break;
                    }
                    TokenKind::LBrace => {
                        end = GroupEnd::Open;
                        break;
                    }
                    TokenKind::RBrace => {
                        end = GroupEnd::Close;
                        break;
                    }
                    _ => {}
                }
            }

            // Comments read past the end of an incomplete group were not
            // inside it; they go back to the main loop.
            if end == GroupEnd::Incomplete {
                let last_line = group.last().map_or(0, |t| t.end_line);
                while hoisted.last().is_some_and(|c| c.line > last_line) {
                    hoisted.pop();
                    idx -= 1;
                }
            }

            let group_end_line = group.last().map_or(token.line, |t| t.end_line);

            // End-of-line comments directly after the group
            let mut eol: Vec<&Token> = Vec::new();
            let mut eol_line = group_end_line;
            while let Some(t) = tokens.get(idx) {
                if t.kind.is_comment() && t.line == eol_line {
                    eol.push(t);
                    eol_line = t.end_line;
                    idx += 1;
                } else {
                    break;
                }
            }

            if end == GroupEnd::Close {
                self.depth = self.depth.saturating_sub(1);
            }
            self.blank_line(blank, end == GroupEnd::Close);

            let mut rendered = self.render_group(&group);
            let keep_eol = self.options.keep_comments_in_place && hoisted.is_empty();
            if keep_eol {
                for c in &eol {
                    if let Some(last) = rendered.last_mut() {
                        last.push(' ');
                        last.push_str(c.kind.text());
                    }
                }
            }
            for line in rendered {
                self.push_line(line);
            }

            self.after_open = end == GroupEnd::Open;
            if self.after_open {
                self.depth += 1;
            }

            let indent = self.indent();
            let mut below = hoisted.clone();
            if !keep_eol {
                below.extend(eol.iter().copied());
            }
            for c in below {
                self.lines.push(format!("{indent}{}", c.kind.text()));
            }

            prev_end_line = Some(eol.last().map_or_else(
                || {
                    hoisted
                        .iter()
                        .map(|c| c.end_line)
                        .chain(std::iter::once(group_end_line))
                        .max()
                        .unwrap_or(group_end_line)
                },
                |c| c.end_line,
            ));
        }

        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Emits one blank line when the source had one and layout allows it.
    fn blank_line(&mut self, had_blank: bool, before_close: bool) {
        if had_blank
            && self.options.collapse_blank_lines
            && !self.after_open
            && !before_close
            && !self.lines.is_empty()
        {
            self.lines.push(String::new());
        }
    }

    fn push_line(&mut self, line: String) {
        self.lines.push(line);
        self.after_open = false;
    }

    fn indent(&self) -> String {
        " ".repeat(self.depth * self.options.indent_width)
    }

    /// Renders a group on one line, or wrapped one list element per line if
    /// the single line is too long and the group has a bracketed list.
    fn render_group(&self, group: &[&Token]) -> Vec<String> {
        let indent = self.indent();
        let single = format!("{indent}{}", join_tokens(group));

        let open = group.iter().position(|t| t.kind == TokenKind::LBracket);
        let close = group.iter().rposition(|t| t.kind == TokenKind::RBracket);
        let (Some(open), Some(close)) = (open, close) else {
            return vec![single];
        };
        if single.chars().count() <= self.options.max_line_length || close <= open + 1 {
            return vec![single];
        }

        let inner_indent = format!("{indent}{}", " ".repeat(self.options.indent_width));
        let mut lines = vec![format!("{indent}{}", join_tokens(&group[..=open]))];
        for element in group[open + 1..close]
            .split(|t| t.kind == TokenKind::Comma)
            .filter(|element| !element.is_empty())
        {
            lines.push(format!("{inner_indent}{},", join_tokens(element)));
        }
        lines.push(format!("{indent}{}", join_tokens(&group[close..])));
        lines
    }
}

/// Joins tokens on one line with canonical spacing.
fn join_tokens(tokens: &[&Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&TokenKind> = None;

    for (idx, token) in tokens.iter().enumerate() {
        let kind = &token.kind;
        let next = tokens.get(idx + 1).map(|t| &t.kind);

        // Trailing comma before a closing bracket is dropped on one line
        if *kind == TokenKind::Comma && next == Some(&TokenKind::RBracket) {
            continue;
        }

        if let Some(prev) = prev {
            if needs_space(prev, kind) {
                out.push(' ');
            }
        }
        out.push_str(kind.text());
        prev = Some(kind);
    }
    out
}

fn needs_space(prev: &TokenKind, next: &TokenKind) -> bool {
    match (prev, next) {
        (TokenKind::LParen | TokenKind::LBracket, _) => false,
        (_, TokenKind::RParen | TokenKind::RBracket | TokenKind::Comma | TokenKind::Semicolon) => {
            false
        }
        (TokenKind::Ident(_), TokenKind::LParen) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(source: &str) -> String {
        format(source, &FormatOptions::default())
    }

    #[test]
    fn test_normalizes_spacing() {
        assert_eq!(fmt("map ( \"A\" ,\"B\" ) ;"), "map(\"A\", \"B\");\n");
    }

    #[test]
    fn test_one_statement_per_line() {
        assert_eq!(
            fmt("map(\"A\",\"B\");map(\"C\",\"D\");"),
            "map(\"A\", \"B\");\nmap(\"C\", \"D\");\n"
        );
    }

    #[test]
    fn test_block_layout() {
        let input = "device(\"x\")\n{\n\n  map(\"A\",\"B\");\n  layer(\"nav\"){map(\"H\",\"Left\");\n\n}\n\n}";
        let expected = "device(\"x\") {\n    map(\"A\", \"B\");\n    layer(\"nav\") {\n        map(\"H\", \"Left\");\n    }\n}\n";
        assert_eq!(fmt(input), expected);
    }

    #[test]
    fn test_collapses_blank_lines() {
        let input = "map(\"A\", \"B\");\n\n\n\nmap(\"C\", \"D\");\n\n\n";
        assert_eq!(fmt(input), "map(\"A\", \"B\");\n\nmap(\"C\", \"D\");\n");

        let options = FormatOptions {
            collapse_blank_lines: false,
            ..FormatOptions::default()
        };
        assert_eq!(format(input, &options), "map(\"A\", \"B\");\nmap(\"C\", \"D\");\n");
    }

    #[test]
    fn test_end_of_line_comment() {
        let input = "map(\"A\", \"B\"); // swap\n";
        assert_eq!(fmt(input), input);

        let options = FormatOptions {
            keep_comments_in_place: false,
            ..FormatOptions::default()
        };
        assert_eq!(format(input, &options), "map(\"A\", \"B\");\n// swap\n");
    }

    #[test]
    fn test_comment_inside_statement_is_hoisted() {
        let input = "map(\"A\", // note\n    \"B\");\nmap(\"C\", \"D\");";
        assert_eq!(fmt(input), "map(\"A\", \"B\");\n// note\nmap(\"C\", \"D\");\n");
    }

    #[test]
    fn test_comment_order_kept_with_end_of_line() {
        let input = "map(\"A\", /* x */ \"B\"); // y\n";
        assert_eq!(fmt(input), "map(\"A\", \"B\");\n/* x */\n// y\n");
    }

    #[test]
    fn test_wraps_long_macro() {
        let input = "macro(\"F1\", [\"H\", \"E\", \"L\", \"L\", \"O\", \"Space\", \"W\", \"O\", \"R\", \"L\", \"D\", \"Enter\"]);";
        let expected = "macro(\"F1\", [\n    \"H\",\n    \"E\",\n    \"L\",\n    \"L\",\n    \"O\",\n    \"Space\",\n    \"W\",\n    \"O\",\n    \"R\",\n    \"L\",\n    \"D\",\n    \"Enter\",\n]);\n";
        let once = fmt(input);
        assert_eq!(once, expected);
        assert_eq!(fmt(&once), once);
    }

    #[test]
    fn test_short_wrapped_list_is_joined() {
        let input = "macro(\"F1\", [\n    \"H\",\n    \"I\",\n]);\n";
        assert_eq!(fmt(input), "macro(\"F1\", [\"H\", \"I\"]);\n");
    }

    #[test]
    fn test_no_blank_after_open_or_before_close() {
        let input = "layer(\"a\") {\n\n\n    map(\"A\", \"B\");\n\n    // tail\n\n}\n";
        assert_eq!(
            fmt(input),
            "layer(\"a\") {\n    map(\"A\", \"B\");\n\n    // tail\n}\n"
        );
    }

    #[test]
    fn test_unparsable_but_lexable() {
        assert_eq!(fmt("map(\"A\",\"B\""), "map(\"A\", \"B\"\n");
    }

    #[test]
    fn test_unlexable_returned_unchanged() {
        let input = "map(\"A\", @);";
        assert_eq!(fmt(input), input);
        assert!(try_format(input, &FormatOptions::default()).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(fmt(""), "");
        assert_eq!(fmt("\n\n  \n"), "");
    }

    #[test]
    fn test_custom_indent() {
        let options = FormatOptions {
            indent_width: 2,
            ..FormatOptions::default()
        };
        assert_eq!(
            format("layer(\"a\"){map(\"A\",\"B\");}", &options),
            "layer(\"a\") {\n  map(\"A\", \"B\");\n}\n"
        );
    }
}
