//! # SELECT Abstract Syntax Tree
//!
//! AST nodes are arena-allocated and borrow identifier and literal text
//! from the input string; a parsed statement is `Copy` and lives as long as
//! the arena and the input do.
//!
//! A statement with no `FROM` clause is a pure-expression select
//! (`table_name == None`): selectors are evaluated once against an empty
//! environment.

use crate::sql::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statement<'a> {
    Select(&'a SelectStmt<'a>),
}

/// A parsed SELECT statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectStmt<'a> {
    pub selectors: &'a [ResultField<'a>],
    pub table_name: Option<&'a str>,
    pub where_expr: Option<&'a Expr<'a>>,
    pub order_by: Option<FieldSelector<'a>>,
    pub order_direction: Direction,
    pub limit_expr: Option<&'a Expr<'a>>,
    pub offset_expr: Option<&'a Expr<'a>>,
}

/// One projected column: the wildcard, or an expression with its output
/// name (the `AS` alias when given, the expression's source text otherwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultField<'a> {
    Wildcard,
    Expr { expr: &'a Expr<'a>, name: &'a str },
}

/// Reference to a record field, usable as an expression or a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector<'a>(pub &'a str);

impl<'a> FieldSelector<'a> {
    pub fn name(&self) -> &'a str {
        self.0
    }
}

/// ORDER BY direction; `Default` means no ASC/DESC was written and sorts
/// ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Default,
    Asc,
    Desc,
}
