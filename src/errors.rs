//! # Error Kinds
//!
//! This module defines the sentinel error kinds surfaced by the storage and
//! table layers. All public APIs return `eyre::Result`; when a caller needs to
//! distinguish a sentinel (a missing record, a duplicate key) from an
//! unexpected failure, the kind travels as the root cause of the report and is
//! recovered with [`kind`] or [`is`].
//!
//! ## Boundary Translation
//!
//! Engine-level misses (`KeyNotFound`, `StoreNotFound`) never escape the crate
//! untranslated: the table layer maps them to `RecordNotFound`, the catalog to
//! `TableNotFound` or `IndexNotFound`, depending on what was being looked up.
//!
//! ## Stopping Iteration
//!
//! Iteration callbacks may return [`stop()`] to end a traversal early. The
//! sentinel is an ordinary error as far as the iteration machinery is
//! concerned; callers that drive a traversal to completion unwrap it with
//! [`filter_stop`].

use eyre::Report;
use thiserror::Error;

/// Sentinel error kinds distinguishable by downcast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("record not found")]
    RecordNotFound,
    #[error("duplicate record id or unique index value")]
    Duplicate,
    #[error("index not found")]
    IndexNotFound,
    #[error("index already exists")]
    IndexAlreadyExists,
    #[error("table not found")]
    TableNotFound,
    #[error("table already exists")]
    TableAlreadyExists,
    #[error("field not found")]
    FieldNotFound,
    #[error("key not found")]
    KeyNotFound,
    #[error("store not found")]
    StoreNotFound,
    #[error("store already exists")]
    StoreAlreadyExists,
    #[error("malformed encoding: {0}")]
    Decode(String),
    #[error("iteration stopped")]
    Stop,
}

/// Returns the sentinel kind carried by a report, if any.
pub fn kind(report: &Report) -> Option<&Error> {
    report.downcast_ref::<Error>()
}

/// Returns true if the report's root cause is the given sentinel kind.
pub fn is(report: &Report, wanted: &Error) -> bool {
    kind(report) == Some(wanted)
}

/// Builds a decode error with the given message.
pub fn decode(msg: impl Into<String>) -> Report {
    Error::Decode(msg.into()).into()
}

/// The sentinel an iteration callback returns to end the traversal early.
pub fn stop() -> Report {
    Error::Stop.into()
}

pub fn is_stop(report: &Report) -> bool {
    is(report, &Error::Stop)
}

/// Collapses the stop sentinel into success, passing real failures through.
pub fn filter_stop<T: Default>(res: eyre::Result<T>) -> eyre::Result<T> {
    match res {
        Err(e) if is_stop(&e) => Ok(T::default()),
        other => other,
    }
}
