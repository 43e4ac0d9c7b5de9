//! Recursive-descent parser for mapping scripts.
//!
//! Grammar:
//!
//! ```text
//! program      := item* EOF
//! item         := statement | device_block | layer_block
//! device_block := "device" "(" STRING ")" "{" (statement | layer_block)* "}"
//! layer_block  := "layer" "(" STRING ")" "{" statement* "}"
//! statement    := call ";"
//! call         := "map" "(" STRING "," STRING ")"
//!               | "tap_hold" "(" STRING "," STRING "," STRING "," NUMBER ")"
//!               | "macro" "(" STRING "," "[" STRING ("," STRING)* ","? "]" ")"
//!               | "layer_switch" "(" STRING "," STRING ")"
//! ```
//!
//! Parsing stops at the first violation. Comments are collected while
//! scanning and handed to the next statement or block header that starts;
//! whatever is left when a block or the file ends becomes its trailing
//! comments.

use super::lexer::{tokenize, Token, TokenKind};
use super::ParseError;
use crate::constants::DEFAULT_MAX_INPUT_BYTES;
use crate::models::{DeviceBlock, Document, Entry, LayerBlock, Mapping, Span};

/// Statement and block names understood by the parser.
pub const KNOWN_FUNCTIONS: &[&str] = &["map", "tap_hold", "macro", "layer_switch", "layer", "device"];

/// Parses a script with the default input size limit.
///
/// # Examples
///
/// ```
/// use mapsync::parser::parse;
///
/// let doc = parse(r#"device("SN1") { map("A", "B"); }"#).unwrap();
/// assert_eq!(doc.devices[0].pattern, "SN1");
/// ```
pub fn parse(source: &str) -> Result<Document, ParseError> {
    parse_with_limit(source, DEFAULT_MAX_INPUT_BYTES)
}

/// Parses a script, rejecting inputs longer than `max_len` bytes before
/// tokenizing.
pub fn parse_with_limit(source: &str, max_len: usize) -> Result<Document, ParseError> {
    if source.len() > max_len {
        return Err(ParseError::new(
            1,
            1,
            format!("input is {} bytes, exceeding the limit of {max_len} bytes", source.len()),
        )
        .with_suggestion("split the script or raise limits.max_input_bytes"));
    }

    let tokens = tokenize(source)?;
    Parser::new(tokens, end_position(source)).document()
}

/// Position just past the last character of `source`.
fn end_position(source: &str) -> (usize, usize) {
    let line = 1 + source.matches('\n').count();
    let last_line = source.rsplit('\n').next().unwrap_or("");
    (line, last_line.chars().count() + 1)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    TopLevel,
    Device,
    Layer,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: (usize, usize),
    pending_comments: Vec<String>,
}

impl Parser {
    const fn new(tokens: Vec<Token>, eof: (usize, usize)) -> Self {
        Self {
            tokens,
            pos: 0,
            eof,
            pending_comments: Vec::new(),
        }
    }

    fn document(mut self) -> Result<Document, ParseError> {
        let mut doc = Document::new();

        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Ident(name) if name == "device" => {
                    doc.devices.push(self.device_block()?);
                }
                TokenKind::Ident(name) if name == "layer" => {
                    doc.layers.push(self.layer_block()?);
                }
                _ => doc.entries.push(self.statement(Context::TopLevel)?),
            }
        }

        doc.trailing_comments = std::mem::take(&mut self.pending_comments);
        Ok(doc)
    }

    fn device_block(&mut self) -> Result<DeviceBlock, ParseError> {
        let (header, comments, pattern) = self.block_header("device")?;
        let mut block = DeviceBlock::new(pattern);
        block.comments = comments;
        block.span = header;

        loop {
            let token = self.peek_or_eof("'}'", "add a closing brace")?;
            match &token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    block.trailing_comments = std::mem::take(&mut self.pending_comments);
                    return Ok(block);
                }
                TokenKind::Ident(name) if name == "layer" => {
                    block.layers.push(self.layer_block()?);
                }
                _ => block.entries.push(self.statement(Context::Device)?),
            }
        }
    }

    fn layer_block(&mut self) -> Result<LayerBlock, ParseError> {
        let (header, comments, name) = self.block_header("layer")?;
        let mut block = LayerBlock::new(name);
        block.comments = comments;
        block.span = header;

        loop {
            let token = self.peek_or_eof("'}'", "add a closing brace")?;
            if token.kind == TokenKind::RBrace {
                self.advance();
                block.trailing_comments = std::mem::take(&mut self.pending_comments);
                return Ok(block);
            }
            block.entries.push(self.statement(Context::Layer)?);
        }
    }

    /// Parses `keyword("name") {` and returns the header span, the comments
    /// written above it and the name.
    fn block_header(&mut self, keyword: &str) -> Result<(Span, Vec<String>, String), ParseError> {
        let token = self.peek_or_eof(keyword, "")?;
        let comments = std::mem::take(&mut self.pending_comments);
        self.advance();

        self.expect(&TokenKind::LParen, "'('", "add an opening parenthesis")?;
        let name = self.expect_string(keyword)?;
        self.expect(&TokenKind::RParen, "')'", "add a closing parenthesis")?;
        self.expect(&TokenKind::LBrace, "'{'", "open the block with '{'")?;

        Ok((Span::new(token.line, token.column), comments, name))
    }

    fn statement(&mut self, context: Context) -> Result<Entry, ParseError> {
        let token = self.peek_or_eof("a statement", "")?;
        let comments = std::mem::take(&mut self.pending_comments);
        let span = Span::new(token.line, token.column);

        let name = match &token.kind {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::RBrace => {
                return Err(self
                    .error_at(&token, "unexpected '}'")
                    .with_suggestion("remove the extra closing brace"));
            }
            other => {
                return Err(self.error_at(&token, format!("expected a statement but found {other}")));
            }
        };

        let mapping = match name.as_str() {
            "map" => {
                self.advance();
                let args = self.string_args(&name, 2)?;
                Mapping::simple(args[0].clone(), args[1].clone())
            }
            "layer_switch" => {
                self.advance();
                let args = self.string_args(&name, 2)?;
                Mapping::layer_switch(args[0].clone(), args[1].clone())
            }
            "tap_hold" => {
                self.advance();
                self.tap_hold()?
            }
            "macro" => {
                self.advance();
                self.macro_call()?
            }
            "device" => {
                let msg = if context == Context::Layer {
                    "device blocks cannot appear inside a layer block"
                } else {
                    "device blocks cannot be nested"
                };
                return Err(self
                    .error_at(&token, msg)
                    .with_suggestion("close the enclosing block first"));
            }
            "layer" => {
                return Err(self
                    .error_at(&token, "layer blocks cannot be nested")
                    .with_suggestion("close the enclosing layer block first"));
            }
            unknown => {
                let err = self.error_at(&token, format!("unknown function '{unknown}'"));
                return Err(match closest_function(unknown) {
                    Some(known) => err.with_suggestion(format!("did you mean '{known}'?")),
                    None => err.with_suggestion(format!(
                        "expected one of: {}",
                        KNOWN_FUNCTIONS.join(", ")
                    )),
                });
            }
        };

        self.expect(&TokenKind::Semicolon, "';'", "add a semicolon")?;
        Ok(Entry {
            mapping,
            comments,
            span,
        })
    }

    /// Parses `( STRING {, STRING} )` with exactly `arity` strings.
    fn string_args(&mut self, function: &str, arity: usize) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::LParen, "'('", "add an opening parenthesis")?;
        let mut args = Vec::with_capacity(arity);
        for idx in 0..arity {
            if idx > 0 {
                self.expect_separator(function, arity)?;
            }
            args.push(self.expect_string(function)?);
        }
        self.expect_close(function, arity)?;
        Ok(args)
    }

    fn tap_hold(&mut self) -> Result<Mapping, ParseError> {
        const NAME: &str = "tap_hold";
        self.expect(&TokenKind::LParen, "'('", "add an opening parenthesis")?;
        let source = self.expect_string(NAME)?;
        self.expect_separator(NAME, 4)?;
        let tap = self.expect_string(NAME)?;
        self.expect_separator(NAME, 4)?;
        let hold = self.expect_string(NAME)?;
        self.expect_separator(NAME, 4)?;

        let token = self.peek_or_eof("a number", "provide a timeout in ms")?;
        let timeout = match &token.kind {
            TokenKind::Number { value, .. } => *value,
            TokenKind::Str { .. } => {
                return Err(self
                    .error_at(&token, "timeout must be a number, not a string")
                    .with_suggestion("provide a timeout in ms, e.g. 200"));
            }
            other => {
                return Err(self
                    .error_at(&token, format!("expected a number but found {other}"))
                    .with_suggestion("provide a timeout in ms"));
            }
        };
        self.advance();
        self.expect_close(NAME, 4)?;

        Ok(Mapping::tap_hold(source, tap, hold, timeout))
    }

    fn macro_call(&mut self) -> Result<Mapping, ParseError> {
        const NAME: &str = "macro";
        self.expect(&TokenKind::LParen, "'('", "add an opening parenthesis")?;
        let source = self.expect_string(NAME)?;
        self.expect_separator(NAME, 2)?;
        self.expect(&TokenKind::LBracket, "'['", "wrap the key list in [ ]")?;

        let mut keys = Vec::new();
        loop {
            let token = self.peek_or_eof("a string", "wrap key name in double quotes")?;
            match &token.kind {
                TokenKind::RBracket if keys.is_empty() => {
                    return Err(self
                        .error_at(&token, "macro key list is empty")
                        .with_suggestion("list at least one key, e.g. [\"H\", \"I\"]"));
                }
                TokenKind::RBracket => {
                    self.advance();
                    break;
                }
                _ => keys.push(self.expect_string(NAME)?),
            }

            let token = self.peek_or_eof("',' or ']'", "add a closing bracket")?;
            match &token.kind {
                TokenKind::Comma => self.advance(),
                TokenKind::RBracket => {
                    self.advance();
                    break;
                }
                TokenKind::Str { .. } => {
                    return Err(self
                        .error_at(&token, format!("expected ',' or ']' but found {}", token.kind))
                        .with_suggestion("separate keys with a comma"));
                }
                other => {
                    return Err(self
                        .error_at(&token, format!("expected ',' or ']' but found {other}"))
                        .with_suggestion("add a closing bracket"));
                }
            }
        }

        self.expect_close(NAME, 2)?;
        Ok(Mapping::Macro {
            source_key: source,
            keys,
        })
    }

    fn expect_separator(&mut self, function: &str, arity: usize) -> Result<(), ParseError> {
        let token = self.peek_or_eof("','", "separate arguments with a comma")?;
        match &token.kind {
            TokenKind::Comma => {
                self.advance();
                Ok(())
            }
            TokenKind::RParen => Err(self
                .error_at(&token, format!("too few arguments to '{function}'"))
                .with_suggestion(format!("'{function}' takes {arity} arguments"))),
            other => Err(self
                .error_at(&token, format!("expected ',' but found {other}"))
                .with_suggestion("separate arguments with a comma")),
        }
    }

    fn expect_close(&mut self, function: &str, arity: usize) -> Result<(), ParseError> {
        let token = self.peek_or_eof("')'", "add a closing parenthesis")?;
        match &token.kind {
            TokenKind::RParen => {
                self.advance();
                Ok(())
            }
            TokenKind::Comma => Err(self
                .error_at(&token, format!("too many arguments to '{function}'"))
                .with_suggestion(format!("'{function}' takes {arity} arguments"))),
            other => Err(self
                .error_at(&token, format!("expected ')' but found {other}"))
                .with_suggestion("add a closing parenthesis")),
        }
    }

    fn expect_string(&mut self, function: &str) -> Result<String, ParseError> {
        let token = self.peek_or_eof("a string", "wrap key name in double quotes")?;
        match token.kind {
            TokenKind::Str { value, .. } => {
                self.advance();
                Ok(value)
            }
            TokenKind::Ident(ref name) => Err(self
                .error_at(&token, format!("expected a string but found {}", token.kind))
                .with_suggestion(format!("wrap key name in double quotes: \"{name}\""))),
            ref other => Err(self
                .error_at(&token, format!("expected a string argument to '{function}' but found {other}"))
                .with_suggestion("wrap key name in double quotes")),
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str, suggestion: &str) -> Result<(), ParseError> {
        let token = self.peek_or_eof(expected, suggestion)?;
        if &token.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self
                .error_at(&token, format!("expected {expected} but found {}", token.kind))
                .with_suggestion(suggestion))
        }
    }

    /// Returns the next non-comment token, moving any comments in front of
    /// it into the pending list.
    fn peek(&mut self) -> Option<Token> {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_comment() {
                return Some(token.clone());
            }
            self.pending_comments.push(token.kind.text().to_string());
            self.pos += 1;
        }
        None
    }

    fn peek_or_eof(&mut self, expected: &str, suggestion: &str) -> Result<Token, ParseError> {
        self.peek().ok_or_else(|| {
            let (line, column) = self.eof;
            let err = ParseError::new(line, column, format!("expected {expected} but found end of input"));
            if suggestion.is_empty() {
                err
            } else {
                err.with_suggestion(suggestion)
            }
        })
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    #[allow(clippy::unused_self)]
    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(token.line, token.column, message)
    }
}

fn closest_function(name: &str) -> Option<&'static str> {
    KNOWN_FUNCTIONS
        .iter()
        .map(|known| (strsim::levenshtein(name, known), *known))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, known)| known)
}
