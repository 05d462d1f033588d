//! Lexer for the Python front-end.
//!
//! Block structure is significant indentation. The lexer measures leading
//! spaces on every non-blank line against an indent stack and synthesizes
//! INDENT/DEDENT tokens, so the parser only ever sees explicit block
//! delimiters. A dedent that lands between two known levels is a
//! structured `InconsistentIndentation` error, not a crash.

use crate::ast::SourceLocation;
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::token::{Token, TokenKind};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            at_line_start: true,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            if self.at_line_start {
                self.handle_indentation(&mut tokens)?;
                if self.is_at_end() {
                    break;
                }
            }

            self.skip_inline_whitespace_and_comments();

            match self.peek() {
                None => {
                    if !matches!(
                        tokens.last().map(|t| &t.kind),
                        Some(TokenKind::Newline) | None
                    ) {
                        tokens.push(Token::new(TokenKind::Newline, "\n", self.current_location()));
                    }
                    break;
                }
                Some('\n') => {
                    let loc = self.current_location();
                    self.advance();
                    self.at_line_start = true;
                    if !matches!(
                        tokens.last().map(|t| &t.kind),
                        Some(TokenKind::Newline) | Some(TokenKind::Indent) | None
                    ) {
                        tokens.push(Token::new(TokenKind::Newline, "\n", loc));
                    }
                }
                Some(_) => {
                    tokens.push(self.next_token()?);
                }
            }
        }

        // Close any open blocks at end of file.
        let eof_loc = self.current_location();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, "", eof_loc));
        }
        tokens.push(Token::new(TokenKind::Eof, "", eof_loc));

        Ok(tokens)
    }

    /// Measure the leading whitespace of the next non-blank line and emit
    /// INDENT/DEDENT tokens against the indent stack.
    fn handle_indentation(&mut self, tokens: &mut Vec<Token>) -> Result<(), SyntaxError> {
        loop {
            let mut width = 0usize;
            let loc = self.current_location();

            loop {
                match self.peek() {
                    Some(' ') => {
                        width += 1;
                        self.advance();
                    }
                    Some('\t') => {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::InconsistentIndentation,
                            "tabs are not allowed in indentation",
                            self.current_location(),
                        ));
                    }
                    _ => break,
                }
            }

            // Blank or comment-only lines don't affect indentation.
            match self.peek() {
                Some('\n') => {
                    self.advance();
                    continue;
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                None => {
                    self.at_line_start = false;
                    return Ok(());
                }
                Some(_) => {}
            }

            let current = *self.indent_stack.last().unwrap_or(&0);
            if width > current {
                self.indent_stack.push(width);
                tokens.push(Token::new(TokenKind::Indent, "", loc));
            } else if width < current {
                while width < *self.indent_stack.last().unwrap_or(&0) {
                    self.indent_stack.pop();
                    tokens.push(Token::new(TokenKind::Dedent, "", loc));
                }
                if width != *self.indent_stack.last().unwrap_or(&0) {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::InconsistentIndentation,
                        "dedent does not match any outer indentation level",
                        loc,
                    ));
                }
            }

            self.at_line_start = false;
            return Ok(());
        }
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| {
            SyntaxError::new(SyntaxErrorKind::UnknownCharacter, "unexpected end of file", loc)
        })?;

        match ch {
            '"' | '\'' => self.string_literal(ch, loc),
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::PlusEqual, "+=", loc))
                } else {
                    Ok(Token::new(TokenKind::Plus, "+", loc))
                }
            }
            '-' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::MinusEqual, "-=", loc))
                } else {
                    Ok(Token::new(TokenKind::Minus, "-", loc))
                }
            }
            '*' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::StarEqual, "*=", loc))
                } else {
                    Ok(Token::new(TokenKind::Star, "*", loc))
                }
            }
            '/' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::SlashEqual, "/=", loc))
                } else {
                    Ok(Token::new(TokenKind::Slash, "/", loc))
                }
            }
            '%' => Ok(Token::new(TokenKind::Percent, "%", loc)),
            '=' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::EqualEqual, "==", loc))
                } else {
                    Ok(Token::new(TokenKind::Equal, "=", loc))
                }
            }
            '!' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::NotEqual, "!=", loc))
                } else {
                    Err(SyntaxError::new(
                        SyntaxErrorKind::UnknownCharacter,
                        "unexpected character: '!'",
                        loc,
                    ))
                }
            }
            '<' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::LessEqual, "<=", loc))
                } else {
                    Ok(Token::new(TokenKind::Less, "<", loc))
                }
            }
            '>' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::GreaterEqual, ">=", loc))
                } else {
                    Ok(Token::new(TokenKind::Greater, ">", loc))
                }
            }
            '(' => Ok(Token::new(TokenKind::LeftParen, "(", loc)),
            ')' => Ok(Token::new(TokenKind::RightParen, ")", loc)),
            '[' => Ok(Token::new(TokenKind::LeftBracket, "[", loc)),
            ']' => Ok(Token::new(TokenKind::RightBracket, "]", loc)),
            '{' => Ok(Token::new(TokenKind::LeftBrace, "{", loc)),
            '}' => Ok(Token::new(TokenKind::RightBrace, "}", loc)),
            ',' => Ok(Token::new(TokenKind::Comma, ",", loc)),
            '.' => Ok(Token::new(TokenKind::Dot, ".", loc)),
            ':' => Ok(Token::new(TokenKind::Colon, ":", loc)),

            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnknownCharacter,
                format!("unexpected character: '{}'", ch),
                loc,
            )
            .with_context("character", ch.to_string())),
        }
    }

    fn string_literal(&mut self, quote: char, loc: SourceLocation) -> Result<Token, SyntaxError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance();
                let lexeme = format!("{}{}{}", quote, string, quote);
                return Ok(Token::new(TokenKind::Str(string), lexeme, loc));
            }
            if ch == '\n' {
                break;
            }
            if ch == '\\' {
                self.advance();
                let escaped = self.advance().ok_or_else(|| {
                    SyntaxError::new(
                        SyntaxErrorKind::UnterminatedString,
                        "unterminated string literal",
                        loc,
                    )
                })?;
                string.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    other => other,
                });
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(SyntaxError::new(
            SyntaxErrorKind::UnterminatedString,
            "unterminated string literal",
            loc,
        ))
    }

    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> Result<Token, SyntaxError> {
        let mut num_str = String::new();
        num_str.push(first_digit);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            num_str.push('.');
            self.advance();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    num_str.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let value = num_str.parse::<f64>().map_err(|_| {
            SyntaxError::new(
                SyntaxErrorKind::InvalidNumber,
                format!("invalid number literal: {}", num_str),
                loc,
            )
        })?;

        Ok(Token::new(TokenKind::Number(value), num_str, loc))
    }

    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match ident.as_str() {
            "def" => TokenKind::Def,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => TokenKind::Identifier(ident.clone()),
        };

        Token::new(kind, ident, loc)
    }

    fn skip_inline_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
