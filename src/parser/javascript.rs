//! Recursive descent parser for the JavaScript front-end.

use crate::ast::{BinaryOp, Construct, Expression, LogicalOp, SourceLocation, Statement, UnaryOp};
use crate::context::LanguageFeatures;
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::javascript::Lexer;
use crate::token::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    features: &'a LanguageFeatures,
}

/// Parse a whole program into the shared statement list.
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
            TokenKind::Let | TokenKind::Const => self.parse_var_declaration(),
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::LeftBrace => {
                let location = self.peek_location();
                let body = self.parse_block()?;
                Ok(Statement::Block { body, location })
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_var_declaration(&mut self) -> Result<Statement, SyntaxError> {
        let keyword = self.advance().clone();
        let constant = keyword.kind == TokenKind::Const;
        let location = keyword.location;

        let name = self.expect_identifier("expected a variable name")?;
        self.expect(
            TokenKind::Equal,
            SyntaxErrorKind::MissingExpression,
            "expected '=' and an initial value; variables must be given a value when declared",
        )?;
        let initializer = self.parse_expression()?;
        self.expect_terminator()?;

        Ok(Statement::VarDeclaration {
            name,
            constant,
            initializer,
            location,
        })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::FunctionDeclaration)?;
        let location = self.advance().location;

        let name = self.expect_identifier("expected a function name")?;
        self.expect(
            TokenKind::LeftParen,
            SyntaxErrorKind::UnexpectedToken,
            "expected '(' after the function name",
        )?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("expected a parameter name")?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_closing_paren(location)?;

        let body = self.parse_block()?;

        Ok(Statement::FunctionDeclaration {
            name,
            params,
            body,
            location,
        })
    }

    fn parse_if(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::If)?;
        let location = self.advance().location;

        self.expect(
            TokenKind::LeftParen,
            SyntaxErrorKind::UnexpectedToken,
            "expected '(' after 'if'",
        )?;
        let condition = self.parse_expression()?;
        self.expect_closing_paren(location)?;

        let then_branch = self.parse_block()?;

        let newlines_before_else = self.position;
        self.skip_newlines();
        let else_branch = if self.match_kind(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            self.position = newlines_before_else;
            None
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

        self.expect(
            TokenKind::LeftParen,
            SyntaxErrorKind::UnexpectedToken,
            "expected '(' after 'while'",
        )?;
        let condition = self.parse_expression()?;
        self.expect_closing_paren(location)?;

        let body = self.parse_block()?;

        Ok(Statement::While {
            condition,
            body,
            location,
        })
    }

    /// Dispatches between the three `for` forms: C-style, `for…in`, and
    /// `for…of`.
    fn parse_for(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;

        self.expect(
            TokenKind::LeftParen,
            SyntaxErrorKind::UnexpectedToken,
            "expected '(' after 'for'",
        )?;

        if matches!(self.peek_kind(), TokenKind::Let | TokenKind::Const) {
            let keyword = self.advance().clone();
            let constant = keyword.kind == TokenKind::Const;
            let name = self.expect_identifier("expected a variable name")?;

            match self.peek_kind() {
                TokenKind::In => {
                    self.guard_construct(Construct::ForIn)?;
                    self.advance();
                    let iterable = self.parse_expression()?;
                    self.expect_closing_paren(location)?;
                    let body = self.parse_block()?;
                    return Ok(Statement::ForIn {
                        variable: name,
                        iterable,
                        body,
                        location,
                    });
                }
                TokenKind::Of => {
                    self.guard_construct(Construct::ForOf)?;
                    self.advance();
                    let iterable = self.parse_expression()?;
                    self.expect_closing_paren(location)?;
                    let body = self.parse_block()?;
                    return Ok(Statement::Foreach {
                        first: name,
                        second: None,
                        iterable,
                        body,
                        location,
                    });
                }
                _ => {
                    // C-style init. A `const` loop variable cannot survive
                    // the update expression, so reject it up front.
                    if constant {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::ConstInForLoopInit,
                            "a 'for' loop counter changes every iteration, so it cannot be declared with 'const'",
                            keyword.location,
                        )
                        .with_context("name", name));
                    }
                    self.guard_construct(Construct::ForLoop)?;
                    self.expect(
                        TokenKind::Equal,
                        SyntaxErrorKind::MissingExpression,
                        "expected '=' and an initial value in the for-loop",
                    )?;
                    let initializer = self.parse_expression()?;
                    let init = Statement::VarDeclaration {
                        name,
                        constant: false,
                        initializer,
                        location: keyword.location,
                    };
                    return self.parse_c_style_for(location, Some(Box::new(init)));
                }
            }
        }

        self.guard_construct(Construct::ForLoop)?;
        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement_no_terminator()?))
        };
        self.parse_c_style_for(location, init)
    }

    fn parse_c_style_for(
        &mut self,
        location: SourceLocation,
        init: Option<Box<Statement>>,
    ) -> Result<Statement, SyntaxError> {
        self.expect(
            TokenKind::Semicolon,
            SyntaxErrorKind::UnexpectedToken,
            "expected ';' after the for-loop initializer",
        )?;

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(
            TokenKind::Semicolon,
            SyntaxErrorKind::UnexpectedToken,
            "expected ';' after the for-loop condition",
        )?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement_no_terminator()?))
        };
        self.expect_closing_paren(location)?;

        let body = self.parse_block()?;

        Ok(Statement::For {
            init,
            condition,
            update,
            body,
            location,
        })
    }

    fn parse_repeat(&mut self) -> Result<Statement, SyntaxError> {
        self.guard_construct(Construct::Repeat)?;
        let location = self.advance().location;

        self.expect(
            TokenKind::LeftParen,
            SyntaxErrorKind::UnexpectedToken,
            "expected '(' after 'repeat'",
        )?;
        let count = self.parse_expression()?;
        self.expect_closing_paren(location)?;

        let body = self.parse_block()?;

        Ok(Statement::Repeat {
            count,
            body,
            location,
        })
    }

    fn parse_return(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;

        let value = if self.at_terminator() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_terminator()?;

        Ok(Statement::Return { value, location })
    }

    fn parse_break(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        self.expect_terminator()?;
        Ok(Statement::Break { location })
    }

    fn parse_continue(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.advance().location;
        self.expect_terminator()?;
        Ok(Statement::Continue { location })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, SyntaxError> {
        let statement = self.parse_simple_statement_no_terminator()?;
        self.expect_terminator()?;
        Ok(statement)
    }

    /// Assignments, increments, and plain expressions, without consuming
    /// the statement terminator (shared with for-loop init/update).
    fn parse_simple_statement_no_terminator(&mut self) -> Result<Statement, SyntaxError> {
        let location = self.peek_location();
        let expression = self.parse_expression()?;

        match self.peek_kind() {
            TokenKind::Equal => {
                self.advance();
                let value = self.parse_expression()?;
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
                match expression {
                    Expression::Variable { name, .. } => Ok(Statement::CompoundAssignment {
                        name,
                        op,
                        value,
                        location,
                    }),
                    _ => Err(SyntaxError::new(
                        SyntaxErrorKind::InvalidAssignmentTarget,
                        "compound assignment only works on a variable",
                        location,
                    )),
                }
            }
            TokenKind::Increment | TokenKind::Decrement => {
                self.guard_construct(Construct::IncrementDecrement)?;
                let increment = self.advance().kind == TokenKind::Increment;
                match expression {
                    Expression::Variable { name, .. } => Ok(Statement::IncDec {
                        name,
                        increment,
                        location,
                    }),
                    _ => Err(SyntaxError::new(
                        SyntaxErrorKind::InvalidAssignmentTarget,
                        "'++' and '--' only work on a variable",
                        location,
                    )),
                }
            }
            _ => {
                // console.log(x) is the log construct, not a method call.
                let statement = match expression {
                    Expression::MethodCall {
                        object,
                        member,
                        mut args,
                        location: call_location,
                    } => {
                        let is_console = matches!(*object, Expression::Variable { ref name, .. } if name == "console");
                        if member == "log" && is_console {
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
                                expression: Expression::MethodCall {
                                    object,
                                    member,
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
            Expression::MemberAccess { object, member, .. } => Ok(Statement::MemberAssignment {
                object: *object,
                member,
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

    fn parse_block(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        self.skip_newlines();
        self.expect(
            TokenKind::LeftBrace,
            SyntaxErrorKind::UnexpectedToken,
            "expected '{' to open a block",
        )?;

        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RightBrace) {
            if self.at_end() {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnexpectedToken,
                    "expected '}' to close the block before the end of the file",
                    self.peek_location(),
                ));
            }
            statements.push(self.parse_statement()?);
            self.skip_newlines();
        }
        self.advance(); // consume '}'

        Ok(statements)
    }

    // Expressions, lowest precedence first.

    fn parse_expression(&mut self) -> Result<Expression, SyntaxError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_logical_and()?;
        while self.check(&TokenKind::PipePipe) {
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
        while self.check(&TokenKind::AmpAmp) {
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
                TokenKind::StrictEqual | TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::StrictNotEqual | TokenKind::NotEqual => BinaryOp::Ne,
                _ => break,
            };
            let location = self.advance().location;
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
            TokenKind::Bang => {
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

    /// Calls, indexing, and member access chained onto a primary.
    fn parse_postfix(&mut self) -> Result<Expression, SyntaxError> {
        let mut expression = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                TokenKind::LeftBracket => {
                    let location = self.advance().location;
                    let index = self.parse_expression()?;
                    self.expect(
                        TokenKind::RightBracket,
                        SyntaxErrorKind::UnexpectedToken,
                        "expected ']' after the index",
                    )?;
                    expression = Expression::Index {
                        object: Box::new(expression),
                        index: Box::new(index),
                        location,
                    };
                }
                TokenKind::Dot => {
                    let location = self.advance().location;
                    let member = self.expect_member_name()?;
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
                    return Err(unterminated_call(open_location));
                }
                args.push(self.parse_expression()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        if !self.match_kind(&TokenKind::RightParen) {
            return Err(unterminated_call(open_location));
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
            TokenKind::Null => {
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
                self.skip_newlines();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        self.skip_newlines();
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                        self.skip_newlines();
                    }
                }
                self.expect(
                    TokenKind::RightBracket,
                    SyntaxErrorKind::UnexpectedToken,
                    "expected ']' to close the array",
                )?;
                Ok(Expression::ListLiteral { elements, location })
            }
            TokenKind::LeftBrace => {
                self.guard_construct(Construct::Dictionary)?;
                self.advance();
                let mut entries = Vec::new();
                self.skip_newlines();
                if !self.check(&TokenKind::RightBrace) {
                    loop {
                        let key = self.expect_dict_key()?;
                        self.expect(
                            TokenKind::Colon,
                            SyntaxErrorKind::UnexpectedToken,
                            "expected ':' after the object key",
                        )?;
                        let value = self.parse_expression()?;
                        entries.push((key, value));
                        self.skip_newlines();
                        if !self.match_kind(&TokenKind::Comma) {
                            break;
                        }
                        self.skip_newlines();
                    }
                }
                self.expect(
                    TokenKind::RightBrace,
                    SyntaxErrorKind::UnexpectedToken,
                    "expected '}' to close the object",
                )?;
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

    fn expect_dict_key(&mut self) -> Result<String, SyntaxError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                format!("expected an object key, found {}", token.kind),
                token.location,
            )),
        }
    }

    fn expect_member_name(&mut self) -> Result<String, SyntaxError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            // Keywords that double as member names.
            TokenKind::Repeat => {
                self.advance();
                Ok("repeat".to_string())
            }
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                format!("expected a property or method name, found {}", token.kind),
                token.location,
            )),
        }
    }

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

    fn expect(
        &mut self,
        kind: TokenKind,
        error_kind: SyntaxErrorKind,
        message: &str,
    ) -> Result<&Token, SyntaxError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(SyntaxError::new(
                error_kind,
                format!("{}, found {}", message, token.kind),
                token.location,
            ))
        }
    }

    fn expect_closing_paren(&mut self, open_location: SourceLocation) -> Result<(), SyntaxError> {
        if self.match_kind(&TokenKind::RightParen) {
            Ok(())
        } else {
            Err(unterminated_call(open_location))
        }
    }

    /// Statement terminator: `;` (mandatory when `require_semicolons`),
    /// otherwise a line end, `}`, or end of file.
    fn expect_terminator(&mut self) -> Result<(), SyntaxError> {
        if self.match_kind(&TokenKind::Semicolon) {
            return Ok(());
        }
        if self.features.require_semicolons {
            let token = self.peek();
            return Err(SyntaxError::new(
                SyntaxErrorKind::MissingSemicolon,
                "expected ';' at the end of the statement",
                token.location,
            ));
        }
        if self.at_terminator() {
            return Ok(());
        }
        let token = self.peek();
        Err(SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken,
            format!("unexpected {} after the statement", token.kind),
            token.location,
        ))
    }

    fn at_terminator(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::RightBrace | TokenKind::Eof | TokenKind::Semicolon
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

fn unterminated_call(open_location: SourceLocation) -> SyntaxError {
    SyntaxError::new(
        SyntaxErrorKind::UnterminatedParentheses,
        "expected ')' to close the call",
        open_location,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    fn parse_ok(source: &str) -> Vec<Statement> {
        parse(source, &LanguageFeatures::default()).unwrap()
    }

    fn parse_err(source: &str) -> SyntaxError {
        parse(source, &LanguageFeatures::default()).unwrap_err()
    }

    #[test]
    fn test_var_declaration() {
        let statements = parse_ok("let x = 42;");
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            statements[0],
            Statement::VarDeclaration { ref name, constant: false, .. } if name == "x"
        ));
    }

    #[test]
    fn test_const_declaration() {
        let statements = parse_ok("const y = 1;");
        assert!(matches!(
            statements[0],
            Statement::VarDeclaration { constant: true, .. }
        ));
    }

    #[test]
    fn test_const_in_for_init_is_rejected() {
        let err = parse_err("for (const i = 0; i < 5; i++) {}");
        assert_eq!(err.kind, SyntaxErrorKind::ConstInForLoopInit);
    }

    #[test]
    fn test_for_in() {
        let statements = parse_ok("for (let k in d) {}");
        assert!(matches!(statements[0], Statement::ForIn { .. }));
    }

    #[test]
    fn test_for_of() {
        let statements = parse_ok("for (const item of items) {}");
        assert!(matches!(
            statements[0],
            Statement::Foreach { second: None, .. }
        ));
    }

    #[test]
    fn test_unterminated_call() {
        let err = parse_err("foo(1, 2");
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedParentheses);
    }

    #[test]
    fn test_missing_expression() {
        let err = parse_err("let x = ;");
        assert_eq!(err.kind, SyntaxErrorKind::MissingExpression);
    }

    #[test]
    fn test_missing_semicolon_when_required() {
        let features = LanguageFeatures {
            require_semicolons: true,
            ..LanguageFeatures::default()
        };
        let err = parse("let x = 1", &features).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingSemicolon);
    }

    #[test]
    fn test_semicolons_optional_by_default() {
        let statements = parse_ok("let x = 1\nlet y = 2");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_console_log_is_log_statement() {
        let statements = parse_ok("console.log(42);");
        assert!(matches!(statements[0], Statement::Log { .. }));
    }

    #[test]
    fn test_disabled_construct() {
        let features = LanguageFeatures {
            exclude_list: vec![Construct::While],
            ..LanguageFeatures::default()
        };
        let err = parse("while (true) {}", &features).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::DisabledLanguageFeature);
    }

    #[test]
    fn test_repeat_statement() {
        let statements = parse_ok("repeat (3) { let x = 1; }");
        assert!(matches!(statements[0], Statement::Repeat { .. }));
    }

    #[test]
    fn test_element_assignment() {
        let statements = parse_ok("items[0] = 5;");
        assert!(matches!(statements[0], Statement::ElementAssignment { .. }));
    }

    #[test]
    fn test_member_assignment() {
        let statements = parse_ok("obj.key = 5;");
        assert!(matches!(statements[0], Statement::MemberAssignment { .. }));
    }

    #[test]
    fn test_increment_statement() {
        let statements = parse_ok("i++;");
        assert!(matches!(
            statements[0],
            Statement::IncDec { increment: true, .. }
        ));
    }

    #[test]
    fn test_if_else_chain() {
        let statements = parse_ok("if (a) {} else if (b) {} else {}");
        match &statements[0] {
            Statement::If { else_branch, .. } => {
                let else_branch = else_branch.as_ref().unwrap();
                assert!(matches!(else_branch[0], Statement::If { .. }));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }
}
