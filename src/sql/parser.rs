//! # SELECT Parser
//!
//! Recursive descent parser with single-token lookahead over the zero-copy
//! lexer, producing an arena-allocated AST. Expressions use Pratt parsing
//! with the usual SQL precedence:
//!
//! | Precedence | Operators |
//! |------------|-----------|
//! | 1 (lowest) | OR |
//! | 2 | AND |
//! | 3 | NOT (prefix) |
//! | 4 | =, !=, <>, <, <=, >, >= |
//! | 5 | +, - (binary) |
//! | 6 | *, /, % |
//! | 7 (highest) | - (unary) |
//!
//! ## Grammar
//!
//! ```text
//! SELECT  = "SELECT" ResultFields [ "FROM" Ident ]
//!           [ "WHERE" Expr ]
//!           [ "ORDER" "BY" FieldRef [ "ASC" | "DESC" ] ]
//!           [ "LIMIT" Expr ]
//!           [ "OFFSET" Expr ]
//! ResultFields = ResultField { "," ResultField }
//! ResultField  = "*" | Expr [ "AS" Ident ]
//! ```
//!
//! A missing `FROM` makes the statement a pure-expression select. An
//! expression selector without an `AS` alias is named by its own source
//! text, sliced straight out of the input.
//!
//! ## Errors
//!
//! Grammar violations produce [`ParseError`] carrying the offending token's
//! text, the set of expected inputs, and the line/column position.

use std::fmt;

use bumpalo::Bump;
use eyre::Result;

use crate::sql::ast::{Direction, FieldSelector, ResultField, SelectStmt, Statement};
use crate::sql::expr::{BinaryOp, Expr, Literal, UnaryOp};
use crate::sql::lexer::Lexer;
use crate::sql::token::{Keyword, Span, Token};


/// Positioned parse error: what was found, what would have been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub found: String,
    pub expected: Vec<&'static str>,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found {}, expected {} at line {}, column {}",
            self.found,
            self.expected.join(" or "),
            self.line,
            self.column
        )
    }
}

impl std::error::Error for ParseError {}

pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    arena: &'a Bump,
    current: Token<'a>,
    current_span: Span,
    last_end: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, arena: &'a Bump) -> Parser<'a> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        let current_span = lexer.span();
        Parser {
            input,
            lexer,
            arena,
            current,
            current_span,
            last_end: 0,
        }
    }

    fn advance(&mut self) -> Token<'a> {
        self.last_end = self.current_span.end();
        let next = self.lexer.next_token();
        self.current_span = self.lexer.span();
        std::mem::replace(&mut self.current, next)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current, Token::Keyword(k) if *k == keyword)
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(vec![keyword.as_str()]))
        }
    }

    fn unexpected(&self, expected: Vec<&'static str>) -> eyre::Report {
        ParseError {
            found: self.current.to_string(),
            expected,
            line: self.lexer.line(),
            column: self.lexer.column(),
        }
        .into()
    }

    /// Source text between `start` and the end of the last consumed token.
    fn source_since(&self, start: usize) -> &'a str {
        self.input[start..self.last_end].trim()
    }

    pub fn parse_statement(&mut self) -> Result<Statement<'a>> {
        match self.current {
            Token::Keyword(Keyword::Select) => {
                let select = self.parse_select()?;
                Ok(Statement::Select(self.arena.alloc(select)))
            }
            _ => Err(self.unexpected(vec!["SELECT"])),
        }
    }

    pub fn parse_select(&mut self) -> Result<SelectStmt<'a>> {
        self.expect_keyword(Keyword::Select)?;

        let selectors = self.parse_result_fields()?;

        let table_name = if self.consume_keyword(Keyword::From) {
            Some(self.parse_ident()?)
        } else {
            None
        };

        let where_expr = if self.consume_keyword(Keyword::Where) {
            let expr = self.parse_expr(0)?;
            Some(&*self.arena.alloc(expr))
        } else {
            None
        };

        let (order_by, order_direction) = self.parse_order_by()?;

        let limit_expr = if self.consume_keyword(Keyword::Limit) {
            let expr = self.parse_expr(0)?;
            Some(&*self.arena.alloc(expr))
        } else {
            None
        };

        let offset_expr = if self.consume_keyword(Keyword::Offset) {
            let expr = self.parse_expr(0)?;
            Some(&*self.arena.alloc(expr))
        } else {
            None
        };

        if matches!(self.current, Token::Semicolon) {
            self.advance();
        }
        if !matches!(self.current, Token::Eof) {
            return Err(self.unexpected(vec!["end of statement"]));
        }

        Ok(SelectStmt {
            selectors,
            table_name,
            where_expr,
            order_by,
            order_direction,
            limit_expr,
            offset_expr,
        })
    }

    fn parse_result_fields(&mut self) -> Result<&'a [ResultField<'a>]> {
        let mut fields = vec![self.parse_result_field()?];
        while matches!(self.current, Token::Comma) {
            self.advance();
            fields.push(self.parse_result_field()?);
        }
        Ok(self.arena.alloc_slice_copy(&fields))
    }

    fn parse_result_field(&mut self) -> Result<ResultField<'a>> {
        if matches!(self.current, Token::Star) {
            self.advance();
            return Ok(ResultField::Wildcard);
        }

        let start = self.current_span.start;
        let expr = self.parse_expr(0)?;
        let name = if self.consume_keyword(Keyword::As) {
            self.parse_ident()?
        } else {
            self.source_since(start)
        };

        Ok(ResultField::Expr {
            expr: self.arena.alloc(expr),
            name,
        })
    }

    fn parse_ident(&mut self) -> Result<&'a str> {
        match self.current {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(vec!["identifier"])),
        }
    }

    fn parse_order_by(&mut self) -> Result<(Option<FieldSelector<'a>>, Direction)> {
        if !self.consume_keyword(Keyword::Order) {
            return Ok((None, Direction::Default));
        }

        self.expect_keyword(Keyword::By)?;
        let field = self.parse_ident()?;

        let direction = if self.consume_keyword(Keyword::Asc) {
            Direction::Asc
        } else if self.consume_keyword(Keyword::Desc) {
            Direction::Desc
        } else {
            Direction::Default
        };

        Ok((Some(FieldSelector(field)), direction))
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr<'a>> {
        let mut lhs = self.parse_primary()?;

        while let Some((op, bp)) = binding_power(&self.current) {
            if bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(bp + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: self.arena.alloc(lhs),
                rhs: self.arena.alloc(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr<'a>> {
        match self.current {
            Token::Number(text) => {
                self.advance();
                parse_number(text)
            }
            Token::String(text) => {
                self.advance();
                Ok(Expr::Literal(Literal::Text(text)))
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            Token::Keyword(Keyword::Not) => {
                self.advance();
                let operand = self.parse_expr(NOT_PRECEDENCE)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: self.arena.alloc(operand),
                })
            }
            Token::Minus => {
                self.advance();
                let operand = self.parse_expr(UNARY_PRECEDENCE)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: self.arena.alloc(operand),
                })
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Expr::Field(FieldSelector(name)))
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                if !matches!(self.current, Token::RParen) {
                    return Err(self.unexpected(vec![")"]));
                }
                self.advance();
                Ok(expr)
            }
            _ => Err(self.unexpected(vec!["expression"])),
        }
    }
}

const NOT_PRECEDENCE: u8 = 3;
const UNARY_PRECEDENCE: u8 = 7;

fn binding_power(token: &Token<'_>) -> Option<(BinaryOp, u8)> {
    Some(match token {
        Token::Keyword(Keyword::Or) => (BinaryOp::Or, 1),
        Token::Keyword(Keyword::And) => (BinaryOp::And, 2),
        Token::Eq => (BinaryOp::Eq, 4),
        Token::Neq => (BinaryOp::Neq, 4),
        Token::Lt => (BinaryOp::Lt, 4),
        Token::LtEq => (BinaryOp::LtEq, 4),
        Token::Gt => (BinaryOp::Gt, 4),
        Token::GtEq => (BinaryOp::GtEq, 4),
        Token::Plus => (BinaryOp::Add, 5),
        Token::Minus => (BinaryOp::Sub, 5),
        Token::Star => (BinaryOp::Mul, 6),
        Token::Slash => (BinaryOp::Div, 6),
        Token::Percent => (BinaryOp::Rem, 6),
        _ => return None,
    })
}

fn parse_number(text: &str) -> Result<Expr<'static>> {
    if text.contains(['.', 'e', 'E']) {
        let value: f64 = text
            .parse()
            .map_err(|e| eyre::eyre!("invalid numeric literal {text:?}: {e}"))?;
        Ok(Expr::Literal(Literal::Float(value)))
    } else {
        let value: i64 = text
            .parse()
            .map_err(|e| eyre::eyre!("invalid integer literal {text:?}: {e}"))?;
        Ok(Expr::Literal(Literal::Int(value)))
    }
}
