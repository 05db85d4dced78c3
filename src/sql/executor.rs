//! # SELECT Execution
//!
//! Walks a parsed [`SelectStmt`] against a transaction: scan the source
//! table, filter by WHERE truthiness, project the selectors, sort, then
//! apply OFFSET and LIMIT. Statements without a FROM clause evaluate their
//! selectors once against an empty environment.
//!
//! Rows come back as [`FieldBuffer`]s: projection output is a fresh record
//! per row, so results stay valid after the transaction ends.

use eyre::{bail, Result};

use crate::database::Tx;
use crate::engine::Transaction;
use crate::errors::{self, Error};
use crate::records::{Field, FieldBuffer, Record};
use crate::sql::ast::{Direction, ResultField, SelectStmt};
use crate::sql::expr::{Environment, Expr};
use crate::types::Value;

/// Executes a SELECT statement, returning the projected rows.
pub fn execute_select<T: Transaction>(
    stmt: &SelectStmt<'_>,
    tx: &Tx<T>,
) -> Result<Vec<FieldBuffer>> {
    let mut rows = match stmt.table_name {
        None => {
            let env = Environment::empty();
            vec![(None, project(stmt.selectors, &env, None)?)]
        }
        Some(table_name) => {
            let table = tx.table(table_name)?;
            let mut rows: Vec<(Option<Value>, FieldBuffer)> = Vec::new();

            table.iterate(&mut |_, record| {
                let env = Environment::with_record(record);

                if let Some(cond) = stmt.where_expr {
                    if !cond.eval(&env)?.is_truthy() {
                        return Ok(());
                    }
                }

                let sort_key = match &stmt.order_by {
                    None => None,
                    Some(selector) => Some(match record.field(selector.name()) {
                        Ok(f) => f.value,
                        Err(e) if errors::is(&e, &Error::FieldNotFound) => Value::Null,
                        Err(e) => return Err(e),
                    }),
                };

                let row = project(stmt.selectors, &env, Some(record))?;
                rows.push((sort_key, row));
                Ok(())
            })?;
            rows
        }
    };

    if stmt.order_by.is_some() {
        rows.sort_by(|(a, _), (b, _)| {
            a.as_ref()
                .unwrap_or(&Value::Null)
                .compare_for_sort(b.as_ref().unwrap_or(&Value::Null))
        });
        if stmt.order_direction == Direction::Desc {
            rows.reverse();
        }
    }

    let mut out: Vec<FieldBuffer> = rows.into_iter().map(|(_, row)| row).collect();

    if let Some(offset) = eval_bound(stmt.offset_expr, "OFFSET")? {
        out.drain(..offset.min(out.len()));
    }
    if let Some(limit) = eval_bound(stmt.limit_expr, "LIMIT")? {
        out.truncate(limit);
    }

    Ok(out)
}

fn project(
    selectors: &[ResultField<'_>],
    env: &Environment<'_>,
    record: Option<&dyn Record>,
) -> Result<FieldBuffer> {
    let mut row = FieldBuffer::new();
    for selector in selectors {
        match selector {
            ResultField::Wildcard => match record {
                Some(r) => {
                    r.iterate(&mut |field| {
                        row.add(field);
                        Ok(())
                    })?;
                }
                None => bail!("wildcard selector requires a FROM clause"),
            },
            ResultField::Expr { expr, name } => {
                let value = expr.eval(env)?;
                row.add(Field::new(*name, value));
            }
        }
    }
    Ok(row)
}

fn eval_bound(expr: Option<&Expr<'_>>, clause: &str) -> Result<Option<usize>> {
    let Some(expr) = expr else {
        return Ok(None);
    };
    let value = expr.eval(&Environment::empty())?;
    match value.as_i128() {
        Some(n) if n >= 0 => Ok(Some(n as usize)),
        Some(n) => bail!("{clause} cannot be negative, got {n}"),
        None => bail!("{clause} must evaluate to an integer, got {value}"),
    }
}
