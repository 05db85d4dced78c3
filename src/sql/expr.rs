//! # Expression Tree and Evaluation
//!
//! Expressions evaluate against an [`Environment`] exposing the current
//! record. Semantics are SQL-flavored:
//!
//! - a field reference absent from the current record (or with no record at
//!   all) evaluates to NULL — heterogeneous tables make absence ordinary
//! - comparisons involving NULL yield NULL; comparisons of mismatched
//!   classes yield false
//! - `AND`/`OR` operate on truthiness (NULL, zero, and empty are falsy)
//! - arithmetic stays in 64-bit integers unless a float is involved;
//!   overflow and division by zero are errors, not wraparound

use eyre::{bail, Result};

use crate::errors::{self, Error};
use crate::records::Record;
use crate::sql::ast::FieldSelector;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Neq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
}

impl BinaryOp {
    fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Neq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'a> {
    Literal(Literal<'a>),
    Field(FieldSelector<'a>),
    Unary {
        op: UnaryOp,
        operand: &'a Expr<'a>,
    },
    Binary {
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    },
}

/// Evaluation environment: the current record, if any.
#[derive(Clone, Copy, Default)]
pub struct Environment<'r> {
    record: Option<&'r dyn Record>,
}

impl<'r> Environment<'r> {
    pub fn empty() -> Environment<'static> {
        Environment { record: None }
    }

    pub fn with_record(record: &'r dyn Record) -> Environment<'r> {
        Environment {
            record: Some(record),
        }
    }

    pub fn record(&self) -> Option<&'r dyn Record> {
        self.record
    }
}

impl<'a> Expr<'a> {
    pub fn eval(&self, env: &Environment<'_>) -> Result<Value> {
        match self {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float64(*f),
                Literal::Text(s) => Value::Text((*s).to_string()),
            }),
            Expr::Field(selector) => match env.record() {
                None => Ok(Value::Null),
                Some(record) => match record.field(selector.name()) {
                    Ok(field) => Ok(field.value),
                    Err(e) if errors::is(&e, &Error::FieldNotFound) => Ok(Value::Null),
                    Err(e) => Err(e),
                },
            },
            Expr::Unary { op, operand } => {
                let value = operand.eval(env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => negate(value),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                if matches!(op, BinaryOp::And | BinaryOp::Or) {
                    let left = lhs.eval(env)?.is_truthy();
                    return Ok(Value::Bool(match op {
                        BinaryOp::And => left && rhs.eval(env)?.is_truthy(),
                        _ => left || rhs.eval(env)?.is_truthy(),
                    }));
                }

                let left = lhs.eval(env)?;
                let right = rhs.eval(env)?;

                if op.is_comparison() {
                    if left.is_null() || right.is_null() {
                        return Ok(Value::Null);
                    }
                    let holds = match left.compare(&right) {
                        // mismatched classes are unequal, nothing more
                        None => *op == BinaryOp::Neq,
                        Some(ord) => match op {
                            BinaryOp::Eq => ord.is_eq(),
                            BinaryOp::Neq => ord.is_ne(),
                            BinaryOp::Lt => ord.is_lt(),
                            BinaryOp::LtEq => ord.is_le(),
                            BinaryOp::Gt => ord.is_gt(),
                            BinaryOp::GtEq => ord.is_ge(),
                            _ => unreachable!(),
                        },
                    };
                    return Ok(Value::Bool(holds));
                }

                arithmetic(*op, left, right)
            }
        }
    }
}

fn negate(value: Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Float32(f) => Ok(Value::Float64(-(f as f64))),
        Value::Float64(f) => Ok(Value::Float64(-f)),
        other => match other.as_i128() {
            Some(i) => int_result(-i),
            None => bail!("cannot negate {other}"),
        },
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    let float_op = matches!(left, Value::Float32(_) | Value::Float64(_))
        || matches!(right, Value::Float32(_) | Value::Float64(_));

    if float_op {
        let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
            bail!("cannot apply arithmetic to {left} and {right}");
        };
        return Ok(Value::Float64(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Rem => a % b,
            _ => unreachable!(),
        }));
    }

    let (Some(a), Some(b)) = (left.as_i128(), right.as_i128()) else {
        bail!("cannot apply arithmetic to {left} and {right}");
    };

    match op {
        BinaryOp::Add => int_result(a + b),
        BinaryOp::Sub => int_result(a - b),
        BinaryOp::Mul => int_result(a * b),
        BinaryOp::Div => {
            if b == 0 {
                bail!("division by zero");
            }
            int_result(a / b)
        }
        BinaryOp::Rem => {
            if b == 0 {
                bail!("division by zero");
            }
            int_result(a % b)
        }
        _ => unreachable!(),
    }
}

fn int_result(v: i128) -> Result<Value> {
    i64::try_from(v)
        .map(Value::Int)
        .map_err(|_| eyre::eyre!("integer overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Field, FieldBuffer};

    fn field_record() -> FieldBuffer {
        let mut fb = FieldBuffer::new();
        fb.add(Field::int("age", 30)).add(Field::text("name", "Ada"));
        fb
    }

    fn eval(expr: &Expr<'_>, record: Option<&FieldBuffer>) -> Value {
        let env = match record {
            Some(r) => Environment::with_record(r),
            None => Environment::empty(),
        };
        expr.eval(&env).unwrap()
    }

    #[test]
    fn literals_evaluate_to_values() {
        assert_eq!(eval(&Expr::Literal(Literal::Int(7)), None), Value::Int(7));
        assert_eq!(
            eval(&Expr::Literal(Literal::Text("x")), None),
            Value::Text("x".into())
        );
        assert_eq!(eval(&Expr::Literal(Literal::Null), None), Value::Null);
    }

    #[test]
    fn field_refs_read_the_record_and_default_to_null() {
        let record = field_record();
        let expr = Expr::Field(FieldSelector("age"));
        assert_eq!(eval(&expr, Some(&record)), Value::Int(30));

        let missing = Expr::Field(FieldSelector("ghost"));
        assert_eq!(eval(&missing, Some(&record)), Value::Null);
        assert_eq!(eval(&missing, None), Value::Null);
    }

    #[test]
    fn comparisons() {
        let age = Expr::Field(FieldSelector("age"));
        let thirty = Expr::Literal(Literal::Int(30));
        let record = field_record();

        let eq = Expr::Binary {
            op: BinaryOp::Eq,
            lhs: &age,
            rhs: &thirty,
        };
        assert_eq!(eval(&eq, Some(&record)), Value::Bool(true));

        let gt = Expr::Binary {
            op: BinaryOp::Gt,
            lhs: &age,
            rhs: &thirty,
        };
        assert_eq!(eval(&gt, Some(&record)), Value::Bool(false));
    }

    #[test]
    fn comparison_with_null_is_null() {
        let null = Expr::Literal(Literal::Null);
        let one = Expr::Literal(Literal::Int(1));
        let expr = Expr::Binary {
            op: BinaryOp::Eq,
            lhs: &null,
            rhs: &one,
        };
        assert_eq!(eval(&expr, None), Value::Null);
    }

    #[test]
    fn and_or_use_truthiness() {
        let truthy = Expr::Literal(Literal::Int(1));
        let falsy = Expr::Literal(Literal::Int(0));
        let and = Expr::Binary {
            op: BinaryOp::And,
            lhs: &truthy,
            rhs: &falsy,
        };
        let or = Expr::Binary {
            op: BinaryOp::Or,
            lhs: &truthy,
            rhs: &falsy,
        };
        assert_eq!(eval(&and, None), Value::Bool(false));
        assert_eq!(eval(&or, None), Value::Bool(true));
    }

    #[test]
    fn arithmetic_and_failure_modes() {
        let six = Expr::Literal(Literal::Int(6));
        let two = Expr::Literal(Literal::Int(2));
        let add = Expr::Binary {
            op: BinaryOp::Add,
            lhs: &six,
            rhs: &two,
        };
        assert_eq!(eval(&add, None), Value::Int(8));

        let zero = Expr::Literal(Literal::Int(0));
        let div = Expr::Binary {
            op: BinaryOp::Div,
            lhs: &six,
            rhs: &zero,
        };
        assert!(div.eval(&Environment::empty()).is_err());

        let half = Expr::Literal(Literal::Float(0.5));
        let mixed = Expr::Binary {
            op: BinaryOp::Mul,
            lhs: &six,
            rhs: &half,
        };
        assert_eq!(eval(&mixed, None), Value::Float64(3.0));
    }

    #[test]
    fn unary_operators() {
        let seven = Expr::Literal(Literal::Int(7));
        let neg = Expr::Unary {
            op: UnaryOp::Neg,
            operand: &seven,
        };
        assert_eq!(eval(&neg, None), Value::Int(-7));

        let not = Expr::Unary {
            op: UnaryOp::Not,
            operand: &seven,
        };
        assert_eq!(eval(&not, None), Value::Bool(false));
    }
}
