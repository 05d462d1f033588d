//! Lexer for the lesson front-end (the pedagogical scripting language).
//!
//! Statements are newline-terminated and blocks are `do … end`, so line
//! breaks are real tokens here rather than skippable whitespace.

use crate::ast::SourceLocation;
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::token::{Token, TokenKind};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments(&mut tokens);

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, "", self.current_location()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| {
            SyntaxError::new(SyntaxErrorKind::UnknownCharacter, "unexpected end of file", loc)
        })?;

        match ch {
            '"' => self.string_literal(loc),
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' => Ok(Token::new(TokenKind::Plus, "+", loc)),
            '-' => Ok(Token::new(TokenKind::Minus, "-", loc)),
            '*' => Ok(Token::new(TokenKind::Star, "*", loc)),
            '/' => Ok(Token::new(TokenKind::Slash, "/", loc)),
            '%' => Ok(Token::new(TokenKind::Percent, "%", loc)),
            '=' => {
                if self.match_char('=') {
                    Ok(Token::new(TokenKind::EqualEqual, "==", loc))
                } else {
                    Err(SyntaxError::new(
                        SyntaxErrorKind::UnknownCharacter,
                        "'=' is not used here; write `set x to value`",
                        loc,
                    ))
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
            ':' => Ok(Token::new(TokenKind::Colon, ":", loc)),

            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnknownCharacter,
                format!("unexpected character: '{}'", ch),
                loc,
            )
            .with_context("character", ch.to_string())),
        }
    }

    fn string_literal(&mut self, loc: SourceLocation) -> Result<Token, SyntaxError> {
        let mut string = String::new();

        while let Some(ch) = self.peek() {
            if ch == '"' {
                self.advance();
                let lexeme = format!("\"{}\"", string);
                return Ok(Token::new(TokenKind::Str(string), lexeme, loc));
            }
            if ch == '\n' {
                break;
            }
            string.push(ch);
            self.advance();
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
            "set" => TokenKind::Set,
            "change" => TokenKind::Change,
            "to" => TokenKind::To,
            "log" => TokenKind::Log,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "repeat" => TokenKind::Repeat,
            "repeat_forever" => TokenKind::RepeatForever,
            "times" => TokenKind::Times,
            "for" => TokenKind::For,
            "each" => TokenKind::Each,
            "in" => TokenKind::In,
            "do" => TokenKind::Do,
            "end" => TokenKind::End,
            "function" => TokenKind::Function,
            "with" => TokenKind::With,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "is" => TokenKind::Is,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Identifier(ident.clone()),
        };

        Token::new(kind, ident, loc)
    }

    fn skip_whitespace_and_comments(&mut self, tokens: &mut Vec<Token>) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    let loc = self.current_location();
                    self.advance();
                    if !matches!(
                        tokens.last().map(|t| &t.kind),
                        Some(TokenKind::Newline) | None
                    ) {
                        tokens.push(Token::new(TokenKind::Newline, "\n", loc));
                    }
                }
                Some('/') if self.peek_ahead(1) == Some('/') => {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_statement() {
        let mut lexer = Lexer::new("set x to 5");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::Set));
        assert!(matches!(tokens[1].kind, TokenKind::Identifier(ref s) if s == "x"));
        assert!(matches!(tokens[2].kind, TokenKind::To));
        assert!(matches!(tokens[3].kind, TokenKind::Number(n) if n == 5.0));
        assert!(matches!(tokens[4].kind, TokenKind::Eof));
    }

    #[test]
    fn test_keywords() {
        let mut lexer = Lexer::new("repeat 3 times do\nend");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::Repeat));
        assert!(matches!(tokens[1].kind, TokenKind::Number(_)));
        assert!(matches!(tokens[2].kind, TokenKind::Times));
        assert!(matches!(tokens[3].kind, TokenKind::Do));
        assert!(matches!(tokens[4].kind, TokenKind::Newline));
        assert!(matches!(tokens[5].kind, TokenKind::End));
    }

    #[test]
    fn test_is_comparison() {
        let mut lexer = Lexer::new("if x is 10 do");
        let tokens = lexer.tokenize().unwrap();
        assert!(matches!(tokens[2].kind, TokenKind::Is));
    }

    #[test]
    fn test_equals_sign_rejected() {
        let mut lexer = Lexer::new("set x = 5");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnknownCharacter);
    }

    #[test]
    fn test_comment_skipped() {
        let mut lexer = Lexer::new("set x to 1 // note\nset y to 2");
        let tokens = lexer.tokenize().unwrap();
        let newline_count = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Newline))
            .count();
        assert_eq!(newline_count, 1);
    }
}
