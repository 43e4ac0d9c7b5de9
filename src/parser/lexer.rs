//! Tokenizer for mapping scripts.
//!
//! Comments are kept as tokens so the parser can attach them to statements
//! and the formatter can reproduce them verbatim.

use super::ParseError;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Kind of a lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Function or block name (`map`, `device`, ...)
    Ident(String),
    /// Double-quoted string; `raw` is the source text including quotes
    Str {
        /// Unescaped value
        value: String,
        /// Source spelling
        raw: String,
    },
    /// Integer literal with optional leading `-`
    Number {
        /// Parsed value
        value: i64,
        /// Source spelling
        raw: String,
    },
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `// ...` without the line break
    LineComment(String),
    /// `/* ... */`
    BlockComment(String),
}

impl TokenKind {
    /// Returns true for line and block comments.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }

    /// Source spelling of the token.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Ident(s) | Self::LineComment(s) | Self::BlockComment(s) => s,
            Self::Str { raw, .. } | Self::Number { raw, .. } => raw,
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "'{name}'"),
            Self::Str { raw, .. } => write!(f, "string {raw}"),
            Self::Number { raw, .. } => write!(f, "number {raw}"),
            Self::LineComment(_) | Self::BlockComment(_) => write!(f, "comment"),
            other => write!(f, "'{}'", other.text()),
        }
    }
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was read
    pub kind: TokenKind,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character
    pub column: usize,
    /// Line of the last character (differs from `line` for block comments)
    pub end_line: usize,
}

/// Splits source text into tokens.
///
/// Whitespace is dropped; comments are kept. The first lexical error stops
/// tokenizing.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let (idx, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some((idx, ch))
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.source.len(), |&(i, _)| i)
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.bump();
                continue;
            }

            let (line, column) = (self.line, self.column);
            let start = self.offset();
            let kind = match ch {
                '(' | ')' | '{' | '}' | '[' | ']' | ',' | ';' => {
                    self.bump();
                    punctuation(ch)
                }
                '"' => self.string(line, column)?,
                '/' => self.comment(start, line, column)?,
                '-' | '0'..='9' => self.number(start, line, column)?,
                c if c.is_ascii_alphabetic() || c == '_' => {
                    while self
                        .peek_char()
                        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
                    {
                        self.bump();
                    }
                    let end = self.offset();
                    TokenKind::Ident(self.source[start..end].to_string())
                }
                other => {
                    return Err(ParseError::new(
                        line,
                        column,
                        format!("unexpected character '{}'", other.escape_default()),
                    ));
                }
            };

            let end_line = if matches!(kind, TokenKind::BlockComment(_)) {
                self.line
            } else {
                line
            };
            tokens.push(Token {
                kind,
                line,
                column,
                end_line,
            });
        }

        Ok(tokens)
    }

    fn string(&mut self, line: usize, column: usize) -> Result<TokenKind, ParseError> {
        let start = self.offset();
        self.bump();
        let mut value = String::new();

        loop {
            let (esc_line, esc_col) = (self.line, self.column);
            match self.bump() {
                None | Some((_, '\n')) => {
                    return Err(ParseError::new(line, column, "unterminated string literal")
                        .with_suggestion("add a closing double quote"));
                }
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.bump() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    None => {
                        return Err(ParseError::new(line, column, "unterminated string literal")
                            .with_suggestion("add a closing double quote"));
                    }
                    Some((_, other)) => {
                        return Err(ParseError::new(
                            esc_line,
                            esc_col,
                            format!("unknown escape sequence '\\{}'", other.escape_default()),
                        )
                        .with_suggestion("use one of \\\" \\\\ \\n \\t"));
                    }
                },
                Some((_, c)) => value.push(c),
            }
        }

        let end = self.offset();
        Ok(TokenKind::Str {
            value,
            raw: self.source[start..end].to_string(),
        })
    }

    fn comment(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind, ParseError> {
        self.bump();
        match self.peek_char() {
            Some('/') => {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.bump();
                }
                let end = self.offset();
                let text = self.source[start..end].trim_end();
                Ok(TokenKind::LineComment(text.to_string()))
            }
            Some('*') => {
                self.bump();
                let mut prev = '\0';
                loop {
                    match self.bump() {
                        None => {
                            return Err(ParseError::new(line, column, "unterminated block comment")
                                .with_suggestion("close the comment with */"));
                        }
                        Some((_, '/')) if prev == '*' => break,
                        Some((_, c)) => prev = c,
                    }
                }
                let end = self.offset();
                Ok(TokenKind::BlockComment(self.source[start..end].to_string()))
            }
            _ => Err(ParseError::new(line, column, "unexpected character '/'")
                .with_suggestion("comments start with // or /*")),
        }
    }

    fn number(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind, ParseError> {
        if self.peek_char() == Some('-') {
            self.bump();
            if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ParseError::new(line, column, "unexpected character '-'")
                    .with_suggestion("negative numbers are written without spaces, e.g. -5"));
            }
        }
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }

        let end = self.offset();
        let raw = &self.source[start..end];
        let value = raw.parse::<i64>().map_err(|_| {
            ParseError::new(line, column, format!("integer literal {raw} is out of range"))
        })?;
        Ok(TokenKind::Number {
            value,
            raw: raw.to_string(),
        })
    }
}

const fn punctuation(ch: char) -> TokenKind {
    match ch {
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        ',' => TokenKind::Comma,
        _ => TokenKind::Semicolon,
    }
}
