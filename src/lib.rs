//! # Vellum - Embeddable Document Database
//!
//! Vellum stores heterogeneous records (ordered sets of named, typed
//! fields) in named tables over a pluggable ordered key-value engine, with
//! secondary indexes maintained synchronously and a SQL-like SELECT layer
//! on top. There is no global schema: two records in the same table may
//! carry different fields.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vellum::{Database, Field, FieldBuffer, MemoryEngine};
//!
//! let db = Database::new(MemoryEngine::new())?;
//!
//! db.update(|tx| {
//!     let users = tx.create_table("users")?;
//!
//!     let mut record = FieldBuffer::new();
//!     record.add(Field::int("id", 1)).add(Field::text("name", "Ada"));
//!     users.insert(&record)?;
//!     Ok(())
//! })?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   SQL Layer (Lexer/Parser/Executor) │
//! ├─────────────────────────────────────┤
//! │  Table Layer │ Catalog │ Indexes    │
//! ├─────────────────────────────────────┤
//! │     Record / Value Codecs           │
//! ├─────────────────────────────────────┤
//! │  Engine Contract (ordered KV store) │
//! └─────────────────────────────────────┘
//! ```
//!
//! The engine contract is the only storage dependency: anything providing
//! named, bytewise-ordered sub-stores inside single-writer/multi-reader
//! transactions can back a database. An in-memory engine ships in
//! [`engine::memory`].
//!
//! ## Module Overview
//!
//! - [`engine`]: storage engine contract and the in-memory engine
//! - [`encoding`]: order-preserving value codecs
//! - [`records`]: record trait, zero-copy encoded records, field buffers
//! - [`index`]: unique and non-unique secondary indexes
//! - [`schema`]: reserved catalog stores for table and index metadata
//! - [`database`]: database handle, transactions, the table layer
//! - [`sql`]: SELECT lexer, parser, and executor

pub mod database;
pub mod encoding;
pub mod engine;
pub mod errors;
pub mod index;
pub mod records;
pub mod schema;
pub mod sql;
pub mod types;

pub use database::{Database, Table, Tx};
pub use engine::MemoryEngine;
pub use errors::Error;
pub use records::{EncodedRecord, Field, FieldBuffer, KeyedRecord, Record, RecordView, Scanner};
pub use types::{FieldType, Value};
