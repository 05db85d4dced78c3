//! # SQL Module
//!
//! Query text enters here: the zero-copy lexer feeds a recursive descent
//! parser that produces an arena-allocated SELECT AST, and the executor
//! walks that AST against a transaction.
//!
//! ## Module Structure
//!
//! - `token`: token and keyword definitions
//! - `lexer`: zero-copy tokenizer
//! - `ast`: SELECT statement nodes
//! - `expr`: expression tree and evaluation
//! - `parser`: recursive descent parser
//! - `executor`: SELECT execution over a transaction
//!
//! ## Example
//!
//! ```ignore
//! use bumpalo::Bump;
//! use vellum::sql::{execute_select, Parser};
//!
//! let arena = Bump::new();
//! let stmt = Parser::new("SELECT name FROM users WHERE age >= 18", &arena)
//!     .parse_select()?;
//! let rows = db.view(|tx| execute_select(&stmt, tx))?;
//! ```

pub mod ast;
pub mod executor;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Direction, FieldSelector, ResultField, SelectStmt, Statement};
pub use executor::execute_select;
pub use expr::{BinaryOp, Environment, Expr, Literal, UnaryOp};
pub use lexer::Lexer;
pub use parser::{ParseError, Parser};
pub use token::{Keyword, Span, Token};
