//! Recursive descent parser for the Python front-end.
//!
//! Blocks are a `:` followed by an INDENT…DEDENT token pair synthesized by
//! the lexer, so this parser never counts spaces itself. Python has no
//! declaration keyword; first-versus-rebinding is resolved at run time,
//! and assignments parse to the shared `Assignment` node.

use crate::ast::{BinaryOp, Construct, Expression, LogicalOp, SourceLocation, Statement, UnaryOp};
use crate::context::LanguageFeatures;
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::python::Lexer;
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
            if self.check(&TokenKind::Indent) {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::InconsistentIndentation,
                    "unexpected indent",
                    self.peek_location(),
                ));
            }
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }

        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        match self.peek_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let location = self.advance().location;
                self.expect_newline()?;
                Ok(Statement::Break { location })
            }
            TokenKind::Continue => {
                let location = self.advance().location;
                self.expect_newline()?;
                Ok(Statement::Continue { location })
            }
            _ => self.parse_simple_statement(),
        }
    }

    /// Assignments, augmented assignments, `print(...)`, and bare
    /// expression statements.
    fn parse_simple_statement(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.peek_location();
        let expression = self.parse_expression()?;

        match self.peek_kind() {
            TokenKind::Equal => {
                self.advance();
                let value = self.parse_expression()?;
                self.expect_newline()?;
                self.build_assignment(expression, value, location)
            }
            TokenKind::PlusEqual
            | TokenKind::MinusEqual
            | TokenKind::StarEqual
            | TokenKind::SlashEqual => {
                self.guard_construct(Construct::CompoundAssignment)?;
                let op = match self.advance().kind {
                    TokenKind::PlusEqual => BinaryOp::Add,
                    TokenKind::MinusEqual => BinaryOp::Sub,
                    TokenKind::StarEqual => BinaryOp::Mul,
                    _ => BinaryOp::Div,
                };
                let value = self.parse_expression()?;
                self.expect_newline()?;
                match expression {
                    Expression::Variable { name, .. } => Ok(Statement::CompoundAssignment {
                        name,
                        op,
                        value,
                        location,
                    }),
                    _ => Err(SyntaxError::new(
                        SyntaxErrorKind::InvalidAssignmentTarget,
                        "augmented assignment only works on a variable",
                        location,
                    )),
                }
            }
            _ => {
                self.expect_newline()?;
                // print(x) is the log construct.
                let statement = match expression {
                    Expression::Call {
                        name,
                        mut args,
                        location: call_location,
                    } => {
                        if name == "print" {
                            let expression = if args.len() == 1 {
                                args.remove(0)
                            } else {
                                Expression::ListLiteral {
                                    elements: args,
                                    location: call_location,
                                }
                            };
                            Statement::Log {
                                expression,
                                location,
                            }
                        } else {
                            Statement::Expression {
                                expression: Expression::Call {
                                    name,
                                    args,
                                    location: call_location,
                                },
                                location,
                            }
                        }
                    }
                    other => Statement::Expression {
                        expression: other,
                        location,
                    },
                };
                Ok(statement)
            }
        }
    }

    fn build_assignment(
        &mut self,
        target: Expression,
        value: Expression,
        location: SourceLocation,
    ) -> Result<Statement, SyntaxError> {
        match target {
            Expression::Variable { name, .. } => Ok(Statement::Assignment {
                name,
                value,
                location,
            }),
            Expression::Index { object, index, .. } => Ok(Statement::ElementAssignment {
                object: *object,
                index: *index,
                value,
                location,
            }),
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::InvalidAssignmentTarget,
                "this is not something that can be assigned to",
                location,
            )),
        }
    }

    fn parse_if(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::If)?;
        let location = self.advance().location;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_suite()?;

        let else_branch = match self.peek_kind() {
            TokenKind::Elif => Some(vec![self.parse_elif()?]),
            TokenKind::Else => {
                self.advance();
                Some(self.parse_suite()?)
            }
            _ => None,
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    /// `elif` parses as a nested `if` in the else branch.
    fn parse_elif(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_suite()?;

        let else_branch = match self.peek_kind() {
            TokenKind::Elif => Some(vec![self.parse_elif()?]),
            TokenKind::Else => {
                self.advance();
                Some(self.parse_suite()?)
            }
            _ => None,
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    fn parse_while(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::While)?;
        let location = self.advance().location;
        let condition = self.parse_expression()?;
        let body = self.parse_suite()?;

        Ok(Statement::While {
            condition,
            body,
            location,
        })
    }

    fn parse_for(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::Foreach)?;
        let location = self.advance().location;
        let first = self.expect_identifier("expected a loop variable name")?;
        let second = if self.match_kind(&TokenKind::Comma) {
            Some(self.expect_identifier("expected a second loop variable name")?)
        } else {
            None
        };
        self.expect(TokenKind::In, "expected 'in' after the loop variable")?;
        let iterable = self.parse_expression()?;
        let body = self.parse_suite()?;

        Ok(Statement::Foreach {
            first,
            second,
            iterable,
            body,
            location,
        })
    }

    fn parse_def(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::FunctionDeclaration)?;
        let location = self.advance().location;
        let name = self.expect_identifier("expected a function name")?;

        self.expect(TokenKind::LeftParen, "expected '(' after the function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("expected a parameter name")?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "expected ')' after the parameters")?;

        let body = self.parse_suite()?;

        Ok(Statement::FunctionDeclaration {
            name,
            params,
            body,
            location,
        })
    }

    fn parse_return(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        let value = if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_newline()?;

        Ok(Statement::Return { value, location })
    }

    /// `: NEWLINE INDENT statements DEDENT`.
    fn parse_suite(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        let colon = self.peek().clone();
        if colon.kind != TokenKind::Colon {
            return Err(SyntaxError::new(
                SyntaxErrorKind::MissingColon,
                format!("expected ':' to open the block, found {}", colon.kind),
                colon.location,
            ));
        }
        self.advance();

        self.expect(TokenKind::Newline, "expected a new line after ':'")?;

        let indent = self.peek().clone();
        if indent.kind != TokenKind::Indent {
            return Err(SyntaxError::new(
                SyntaxErrorKind::MissingIndent,
                "expected an indented block",
                indent.location,
            ));
        }
        self.advance();

        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::Dedent) {
            if self.at_end() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedDedent,
                    "block was never closed",
                    self.peek_location(),
                ));
            }
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.advance(); // consume DEDENT

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
        let mut left = self.parse_not()?;
        while self.check(&TokenKind::And) {
            let location = self.advance().location;
            let right = self.parse_not()?;
            left = Expression::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expression, SyntaxError> {
        if self.check(&TokenKind::Not) {
            let location = self.advance().location;
            let operand = self.parse_not()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                location,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::NotEqual => BinaryOp::Ne,
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
        if self.check(&TokenKind::Minus) {
            let location = self.advance().location;
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                location,
            });
        }
        self.parse_postfix()
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
                TokenKind::Dot => {
                    let location = self.advance().location;
                    let member = self.expect_identifier("expected an attribute name after '.'")?;
                    if self.check(&TokenKind::LeftParen) {
                        self.guard_construct(Construct::MethodCall)?;
                        let args = self.parse_call_args(location)?;
                        expression = Expression::MethodCall {
                            object: Box::new(expression),
                            member,
                            args,
                            location,
                        };
                    } else {
                        expression = Expression::MemberAccess {
                            object: Box::new(expression),
                            member,
                            location,
                        };
                    }
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
            TokenKind::None => {
                self.advance();
                Ok(Expression::NoneLiteral { location })
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
                self.expect(TokenKind::RightBrace, "expected '}' to close the dict")?;
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

    fn expect_newline(&mut self) -> Result<(), SyntaxError> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::Dedent => Ok(()),
            _ => {
                let token = self.peek();
                Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedToken,
                    format!("unexpected {} after the statement", token.kind),
                    token.location,
                ))
            }
        }
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
    fn test_assignment() {
        let statements = parse_ok("x = 42");
        assert!(matches!(statements[0], Statement::Assignment { .. }));
    }

    #[test]
    fn test_print_is_log() {
        let statements = parse_ok("print(42)");
        assert!(matches!(statements[0], Statement::Log { .. }));
    }

    #[test]
    fn test_if_elif_else() {
        let statements = parse_ok("if x == 1:\n    y = 1\nelif x == 2:\n    y = 2\nelse:\n    y = 3");
        match &statements[0] {
            Statement::If { else_branch, .. } => {
                let else_branch = else_branch.as_ref().unwrap();
                assert!(matches!(else_branch[0], Statement::If { .. }));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while_suite() {
        let statements = parse_ok("while x < 3:\n    x += 1");
        match &statements[0] {
            Statement::While { body, .. } => assert_eq!(body.len(), 1),
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_for_loop() {
        let statements = parse_ok("for item in items:\n    print(item)");
        assert!(matches!(statements[0], Statement::Foreach { .. }));
    }

    #[test]
    fn test_def() {
        let statements = parse_ok("def add(a, b):\n    return a + b");
        match &statements[0] {
            Statement::FunctionDeclaration { name, params, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
            }
            other => panic!("expected def, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_colon() {
        let err = parse("if x == 1\n    y = 1", &LanguageFeatures::default()).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingColon);
    }

    #[test]
    fn test_missing_indent() {
        let err = parse("if x == 1:\ny = 1", &LanguageFeatures::default()).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingIndent);
    }

    #[test]
    fn test_method_call() {
        let statements = parse_ok("y = s.upper()");
        match &statements[0] {
            Statement::Assignment { value, .. } => {
                assert!(matches!(value, Expression::MethodCall { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_blocks() {
        let statements = parse_ok("if a:\n    if b:\n        x = 1\n    y = 2\nz = 3");
        assert_eq!(statements.len(), 2);
    }
}
