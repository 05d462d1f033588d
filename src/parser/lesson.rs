//! Recursive descent parser for the lesson front-end.
//!
//! Statements are one per line; blocks open with `do` and close with
//! `end`. Assignment is spelled `set x to value` (first binding) and
//! `change x to value` (rebinding), so declaration and mutation are
//! distinct constructs learners can be taught separately.

use crate::ast::{BinaryOp, Construct, Expression, LogicalOp, SourceLocation, Statement, UnaryOp};
use crate::context::LanguageFeatures;
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::lesson::Lexer;
use crate::token::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    features: &'a LanguageFeatures,
}

pub fn parse(source: &str, features: &LanguageFeatures) -> Result<Vec<Statement>, SyntaxError> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens, features).parse_program()
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, features: &'a LanguageFeatures) -> Self {
        Self {
            tokens,
            position: 0,
            features,
        }
    }

    pub fn parse_program(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        let mut statements = Vec::new();

        self.skip_newlines();
        while !self.at_end() {
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        match self.peek_kind() {
            TokenKind::Set => self.parse_set(),
            TokenKind::Change => self.parse_change(),
            TokenKind::Log => self.parse_log(),
            TokenKind::If => self.parse_if(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::RepeatForever => self.parse_repeat_forever(),
            TokenKind::For => self.parse_foreach(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let location = self.advance().location;
                self.expect_end_of_statement()?;
                Ok(Statement::Break { location })
            }
            TokenKind::Continue => {
                let location = self.advance().location;
                self.expect_end_of_statement()?;
                Ok(Statement::Continue { location })
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_set(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        let name = self.expect_identifier("expected a variable name after 'set'")?;
        self.expect(TokenKind::To, "expected 'to' after the variable name")?;
        let initializer = self.parse_expression()?;
        self.expect_end_of_statement()?;

        Ok(Statement::VarDeclaration {
            name,
            constant: false,
            initializer,
            location,
        })
    }

    /// `change x to v` and `change items[i] to v`.
    fn parse_change(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        let name = self.expect_identifier("expected a variable name after 'change'")?;

        if self.check(&TokenKind::LeftBracket) {
            let bracket_location = self.advance().location;
            let index = self.parse_expression()?;
            self.expect(TokenKind::RightBracket, "expected ']' after the index")?;
            self.expect(TokenKind::To, "expected 'to' after the element")?;
            let value = self.parse_expression()?;
            self.expect_end_of_statement()?;

            return Ok(Statement::ElementAssignment {
                object: Expression::Variable {
                    name,
                    location: bracket_location,
                },
                index,
                value,
                location,
            });
        }

        self.expect(TokenKind::To, "expected 'to' after the variable name")?;
        let value = self.parse_expression()?;
        self.expect_end_of_statement()?;

        Ok(Statement::Assignment {
            name,
            value,
            location,
        })
    }

    fn parse_log(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        let expression = self.parse_expression()?;
        self.expect_end_of_statement()?;
        Ok(Statement::Log {
            expression,
            location,
        })
    }

    /// `if cond do … end`, with the then-block also terminable by `else`:
    /// `if cond do … else do … end` and `else if` chains.
    fn parse_if(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::If)?;
        let location = self.advance().location;
        let condition = self.parse_expression()?;

        let do_location = self.peek_location();
        self.expect(TokenKind::Do, "expected 'do' to open the block")?;
        self.skip_newlines();

        let mut then_branch = Vec::new();
        let else_branch = loop {
            match self.peek_kind() {
                TokenKind::End => {
                    self.advance();
                    break None;
                }
                TokenKind::Else => {
                    self.advance();
                    if self.check(&TokenKind::If) {
                        break Some(vec![self.parse_if()?]);
                    }
                    break Some(self.parse_do_block()?);
                }
                TokenKind::Eof => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::MissingEndKeyword,
                        "expected 'end' to close the block before the end of the file",
                        do_location,
                    ));
                }
                _ => {
                    then_branch.push(self.parse_statement()?);
                    self.skip_newlines();
                }
            }
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    fn parse_repeat(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::Repeat)?;
        let location = self.advance().location;
        let count = self.parse_expression()?;
        self.expect(TokenKind::Times, "expected 'times' after the repeat count")?;
        let body = self.parse_do_block()?;

        Ok(Statement::Repeat {
            count,
            body,
            location,
        })
    }

    fn parse_repeat_forever(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::RepeatForever)?;
        let location = self.advance().location;
        let body = self.parse_do_block()?;

        Ok(Statement::RepeatForever { body, location })
    }

    /// `for each x in items do` and `for each k, v in dict do`.
    fn parse_foreach(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::Foreach)?;
        let location = self.advance().location;
        self.expect(TokenKind::Each, "expected 'each' after 'for'")?;

        let first = self.expect_identifier("expected a loop variable name")?;
        let second = if self.match_kind(&TokenKind::Comma) {
            Some(self.expect_identifier("expected a second loop variable name")?)
        } else {
            None
        };

        self.expect(TokenKind::In, "expected 'in' after the loop variable")?;
        let iterable = self.parse_expression()?;
        let body = self.parse_do_block()?;

        Ok(Statement::Foreach {
            first,
            second,
            iterable,
            body,
            location,
        })
    }

    fn parse_function(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::FunctionDeclaration)?;
        let location = self.advance().location;
        let name = self.expect_identifier("expected a function name")?;

        let mut params = Vec::new();
        if self.match_kind(&TokenKind::With) {
            loop {
                params.push(self.expect_identifier("expected a parameter name")?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let body = self.parse_do_block()?;

        Ok(Statement::FunctionDeclaration {
            name,
            params,
            body,
            location,
        })
    }

    fn parse_return(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_end_of_statement()?;

        Ok(Statement::Return { value, location })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.peek_location();
        let expression = self.parse_expression()?;
        self.expect_end_of_statement()?;
        Ok(Statement::Expression {
            expression,
            location,
        })
    }

    /// `do <newline> statements end`.
    fn parse_do_block(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        let do_location = self.peek_location();
        self.expect(TokenKind::Do, "expected 'do' to open the block")?;
        self.skip_newlines();

        let mut statements = Vec::new();
        while !self.check(&TokenKind::End) {
            if self.at_end() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::MissingEndKeyword,
                    "expected 'end' to close the block before the end of the file",
                    do_location,
                ));
            }
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.advance(); // consume 'end'

        Ok(statements)
    }

    // Expressions.

    fn parse_expression(&mut self) -> Result<Expression, SyntaxError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_logical_and()?;
        while self.check(&TokenKind::Or) {
            let location = self.advance().location;
            let right = self.parse_logical_and()?;
            left = Expression::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            let location = self.advance().location;
            let right = self.parse_equality()?;
            left = Expression::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Is | TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::NotEqual => BinaryOp::Ne,
                _ => break,
            };
            // `is not` negates the comparison.
            let location = self.advance().location;
            let op = if op == BinaryOp::Eq && self.check(&TokenKind::Not) {
                self.advance();
                BinaryOp::Ne
            } else {
                op
            };
            let right = self.parse_comparison()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::LessEqual => BinaryOp::Le,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::GreaterEqual => BinaryOp::Ge,
                _ => break,
            };
            let location = self.advance().location;
            let right = self.parse_term()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let location = self.advance().location;
            let right = self.parse_factor()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let location = self.advance().location;
            let right = self.parse_unary()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, SyntaxError> {
        match self.peek_kind() {
            TokenKind::Minus => {
                let location = self.advance().location;
                let operand = self.parse_unary()?;
                Ok(Expression::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    location,
                })
            }
            TokenKind::Not => {
                let location = self.advance().location;
                let operand = self.parse_unary()?;
                Ok(Expression::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    location,
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression, SyntaxError> {
        let mut expression = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LeftBracket => {
                    let location = self.advance().location;
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RightBracket, "expected ']' after the index")?;
                    expression = Expression::Index {
                        object: Box::new(expression),
                        index: Box::new(index),
                        location,
                    };
                }
                TokenKind::LeftParen => {
                    let location = self.peek_location();
                    match expression {
                        Expression::Variable { name, .. } => {
                            let args = self.parse_call_args(location)?;
                            expression = Expression::Call {
                                name,
                                args,
                                location,
                            };
                        }
                        _ => {
                            return Err(SyntaxError::new(
                                SyntaxErrorKind::UnexpectedToken,
                                "only named functions can be called",
                                location,
                            ));
                        }
                    }
                }
                _ => break,
            }
        }

        Ok(expression)
    }

    fn parse_call_args(&mut self, open_location: SourceLocation) -> Result<Vec<Expression>, SyntaxError> {
        self.advance(); // consume '('
        let mut args = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                if self.at_end() || self.check(&TokenKind::Newline) {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnterminatedParentheses,
                        "expected ')' to close the call",
                        open_location,
                    ));
                }
                args.push(self.parse_expression()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        if !self.match_kind(&TokenKind::RightParen) {
            return Err(SyntaxError::new(
                SyntaxErrorKind::UnterminatedParentheses,
                "expected ')' to close the call",
                open_location,
            ));
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expression, SyntaxError> {
        let token = self.peek().clone();
        let location = token.location;

        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expression::NumberLiteral { value, location })
            }
            TokenKind::Str(ref value) => {
                let value = value.clone();
                self.advance();
                Ok(Expression::StringLiteral { value, location })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::BoolLiteral {
                    value: true,
                    location,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::BoolLiteral {
                    value: false,
                    location,
                })
            }
            TokenKind::Identifier(ref name) => {
                let name = name.clone();
                self.advance();
                Ok(Expression::Variable { name, location })
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                if !self.match_kind(&TokenKind::RightParen) {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnterminatedParentheses,
                        "expected ')' to close the parentheses",
                        location,
                    ));
                }
                Ok(Expression::Grouping {
                    inner: Box::new(inner),
                    location,
                })
            }
            TokenKind::LeftBracket => {
                self.guard_construct(Construct::List)?;
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RightBracket, "expected ']' to close the list")?;
                Ok(Expression::ListLiteral { elements, location })
            }
            TokenKind::LeftBrace => {
                self.guard_construct(Construct::Dictionary)?;
                self.advance();
                let mut entries = Vec::new();
                if !self.check(&TokenKind::RightBrace) {
                    loop {
                        let key = match self.peek().clone().kind {
                            TokenKind::Str(value) => {
                                self.advance();
                                value
                            }
                            other => {
                                return Err(SyntaxError::new(
                                    SyntaxErrorKind::UnexpectedToken,
                                    format!("expected a string key, found {}", other),
                                    self.peek_location(),
                                ));
                            }
                        };
                        self.expect(TokenKind::Colon, "expected ':' after the key")?;
                        let value = self.parse_expression()?;
                        entries.push((key, value));
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RightBrace, "expected '}' to close the dictionary")?;
                Ok(Expression::DictLiteral { entries, location })
            }
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::MissingExpression,
                format!("expected an expression, found {}", token.kind),
                location,
            )),
        }
    }

    // Token helpers.

    fn expect_identifier(&mut self, message: &str) -> Result<String, SyntaxError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                format!("{}, found {}", message, token.kind),
                token.location,
            )),
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<&Token, SyntaxError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                format!("{}, found {}", message, token.kind),
                token.location,
            ))
        }
    }

    fn expect_end_of_statement(&mut self) -> Result<(), SyntaxError> {
        if self.at_statement_end() {
            self.match_kind(&TokenKind::Newline);
            Ok(())
        } else {
            let token = self.peek();
            Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                format!("unexpected {} after the statement", token.kind),
                token.location,
            ))
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Eof | TokenKind::End | TokenKind::Else
        )
    }

    fn guard_construct(&self, construct: Construct) -> Result<(), SyntaxError> {
        if self.features.excludes(construct) {
            let token = self.peek();
            Err(SyntaxError::new(
                SyntaxErrorKind::DisabledLanguageFeature,
                format!("'{}' is not available in this exercise", construct.name()),
                token.location,
            )
            .with_context("construct", construct.name()))
        } else {
            Ok(())
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.position += 1;
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_location(&self) -> SourceLocation {
        self.peek().location
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> &Token {
        let position = self.position;
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        &self.tokens[position]
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    fn parse_ok(source: &str) -> Vec<Statement> {
        parse(source, &LanguageFeatures::default()).unwrap()
    }

    #[test]
    fn test_set_statement() {
        let statements = parse_ok("set x to 5");
        assert!(matches!(
            statements[0],
            Statement::VarDeclaration { ref name, .. } if name == "x"
        ));
    }

    #[test]
    fn test_change_statement() {
        let statements = parse_ok("set x to 5\nchange x to 6");
        assert!(matches!(statements[1], Statement::Assignment { .. }));
    }

    #[test]
    fn test_change_element() {
        let statements = parse_ok("change items[1] to 5");
        assert!(matches!(statements[0], Statement::ElementAssignment { .. }));
    }

    #[test]
    fn test_repeat_block() {
        let statements = parse_ok("repeat 3 times do\n  log 1\nend");
        match &statements[0] {
            Statement::Repeat { body, .. } => assert_eq!(body.len(), 1),
            other => panic!("expected repeat, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_forever() {
        let statements = parse_ok("repeat_forever do\n  log 1\nend");
        assert!(matches!(statements[0], Statement::RepeatForever { .. }));
    }

    #[test]
    fn test_function_with_params() {
        let statements = parse_ok("function add with a, b do\n  return a + b\nend");
        match &statements[0] {
            Statement::FunctionDeclaration { name, params, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_foreach_with_two_names() {
        let statements = parse_ok("for each k, v in dict do\nend");
        assert!(matches!(
            statements[0],
            Statement::Foreach { second: Some(_), .. }
        ));
    }

    #[test]
    fn test_is_comparison() {
        let statements = parse_ok("if x is 10 do\nend");
        assert!(matches!(statements[0], Statement::If { .. }));
    }

    #[test]
    fn test_missing_end() {
        let err = parse("repeat 3 times do\n  log 1", &LanguageFeatures::default()).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingEndKeyword);
    }

    #[test]
    fn test_if_else() {
        let statements = parse_ok("if x is 1 do\n  log 1\nelse do\n  log 2\nend");
        match &statements[0] {
            Statement::If { else_branch, .. } => assert!(else_branch.is_some()),
            other => panic!("expected if, got {:?}", other),
        }
    }
}
