//! Lexer for the JavaScript front-end.

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

    /// Tokenize the entire input.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments(&mut tokens)?;

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
            '"' | '\'' => self.string_literal(ch, loc),
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' | '$' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' => {
                if self.match_char('+') {
                    Ok(Token::new(TokenKind::Increment, "++", loc))
                } else if self.match_char('=') {
                    Ok(Token::new(TokenKind::PlusEqual, "+=", loc))
                } else {
                    Ok(Token::new(TokenKind::Plus, "+", loc))
                }
            }
            '-' => {
                if self.match_char('-') {
                    Ok(Token::new(TokenKind::Decrement, "--", loc))
                } else if self.match_char('=') {
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
                    if self.match_char('=') {
                        Ok(Token::new(TokenKind::StrictEqual, "===", loc))
                    } else {
                        Ok(Token::new(TokenKind::EqualEqual, "==", loc))
                    }
                } else {
                    Ok(Token::new(TokenKind::Equal, "=", loc))
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        Ok(Token::new(TokenKind::StrictNotEqual, "!==", loc))
                    } else {
                        Ok(Token::new(TokenKind::NotEqual, "!=", loc))
                    }
                } else {
                    Ok(Token::new(TokenKind::Bang, "!", loc))
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
            '&' => {
                if self.match_char('&') {
                    Ok(Token::new(TokenKind::AmpAmp, "&&", loc))
                } else {
                    Err(SyntaxError::new(
                        SyntaxErrorKind::UnknownCharacter,
                        "unexpected character: '&'",
                        loc,
                    ))
                }
            }
            '|' => {
                if self.match_char('|') {
                    Ok(Token::new(TokenKind::PipePipe, "||", loc))
                } else {
                    Err(SyntaxError::new(
                        SyntaxErrorKind::UnknownCharacter,
                        "unexpected character: '|'",
                        loc,
                    ))
                }
            }
            '(' => Ok(Token::new(TokenKind::LeftParen, "(", loc)),
            ')' => Ok(Token::new(TokenKind::RightParen, ")", loc)),
            '{' => Ok(Token::new(TokenKind::LeftBrace, "{", loc)),
            '}' => Ok(Token::new(TokenKind::RightBrace, "}", loc)),
            '[' => Ok(Token::new(TokenKind::LeftBracket, "[", loc)),
            ']' => Ok(Token::new(TokenKind::RightBracket, "]", loc)),
            ',' => Ok(Token::new(TokenKind::Comma, ",", loc)),
            '.' => Ok(Token::new(TokenKind::Dot, ".", loc)),
            ':' => Ok(Token::new(TokenKind::Colon, ":", loc)),
            ';' => Ok(Token::new(TokenKind::Semicolon, ";", loc)),

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
                    'r' => '\r',
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
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match ident.as_str() {
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "of" => TokenKind::Of,
            "repeat" => TokenKind::Repeat,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier(ident.clone()),
        };

        Token::new(kind, ident, loc)
    }

    /// Skips spaces and comments, emitting a Newline token per line break
    /// so the parser can use line ends as soft statement terminators.
    fn skip_whitespace_and_comments(&mut self, tokens: &mut Vec<Token>) -> Result<(), SyntaxError> {
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
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        while let Some(ch) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), SyntaxError> {
        let start_loc = self.current_location();
        self.advance(); // '/'
        self.advance(); // '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(SyntaxError::new(
            SyntaxErrorKind::UnknownCharacter,
            "unterminated block comment",
            start_loc,
        ))
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
    fn test_simple_tokens() {
        let mut lexer = Lexer::new("let x = 42;");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::Let));
        assert!(matches!(tokens[1].kind, TokenKind::Identifier(ref s) if s == "x"));
        assert!(matches!(tokens[2].kind, TokenKind::Equal));
        assert!(matches!(tokens[3].kind, TokenKind::Number(n) if n == 42.0));
        assert!(matches!(tokens[4].kind, TokenKind::Semicolon));
        assert!(matches!(tokens[5].kind, TokenKind::Eof));
    }

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new("++ -- += === !== && ||");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::Increment));
        assert!(matches!(tokens[1].kind, TokenKind::Decrement));
        assert!(matches!(tokens[2].kind, TokenKind::PlusEqual));
        assert!(matches!(tokens[3].kind, TokenKind::StrictEqual));
        assert!(matches!(tokens[4].kind, TokenKind::StrictNotEqual));
        assert!(matches!(tokens[5].kind, TokenKind::AmpAmp));
        assert!(matches!(tokens[6].kind, TokenKind::PipePipe));
    }

    #[test]
    fn test_string_literals() {
        let mut lexer = Lexer::new(r#""hello" 'world'"#);
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::Str(ref s) if s == "hello"));
        assert!(matches!(tokens[1].kind, TokenKind::Str(ref s) if s == "world"));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"oops");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedString);
    }

    #[test]
    fn test_comments_are_skipped() {
        let mut lexer = Lexer::new("let a; // trailing\n/* block\ncomment */ let b;");
        let tokens = lexer.tokenize().unwrap();
        let idents: Vec<_> = tokens
            .iter()
            .filter_map(|t| match &t.kind {
                TokenKind::Identifier(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["a", "b"]);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let mut lexer = Lexer::new("let x;\nlet y;");
        let tokens = lexer.tokenize().unwrap();
        let y_decl = tokens
            .iter()
            .find(|t| matches!(&t.kind, TokenKind::Identifier(s) if s == "y"))
            .unwrap();
        assert_eq!(y_decl.location.line, 2);
        assert_eq!(y_decl.location.column, 5);
    }

    #[test]
    fn test_decimal_numbers() {
        let mut lexer = Lexer::new("3.25");
        let tokens = lexer.tokenize().unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Number(n) if n == 3.25));
    }
}
