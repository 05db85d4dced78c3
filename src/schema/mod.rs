//! # Schema Catalog
//!
//! The catalog persists table and index metadata in two reserved stores,
//! rebuilt by range scan on open:
//!
//! - `__vellum_tables`: one record per user table, keyed by table name
//! - `__vellum_indexes`: one [`IndexConfig`] record per index, keyed by the
//!   index's backing store name
//!
//! The reserved `__vellum` prefix is unreachable from the SQL identifier
//! grammar, so user tables can never collide with catalog state. An index's
//! backing store is named `__vellum_idx_ ‖ table ‖ 0x1E ‖ field`; listing
//! stores by that prefix and stripping it recovers a table's indexed fields
//! without a separate lookup table.
//!
//! Catalog writes share the caller's transaction, so registering an index
//! record and creating its backing store commit or roll back together.

mod catalog;

pub use catalog::{
    create_table, drop_table, ensure_catalog, index_catalog_table, index_store_name, list_tables,
    read_index_options, IndexConfig,
};

/// Reserved store holding one record per user table.
pub const TABLES_STORE: &str = "__vellum_tables";

/// Reserved store holding one options record per index.
pub const INDEXES_STORE: &str = "__vellum_indexes";

/// Prefix of every index backing-store name.
pub const INDEX_PREFIX: &str = "__vellum_idx_";

/// Reserved namespace prefix user tables may not use.
pub const RESERVED_PREFIX: &str = "__vellum";

/// ASCII record separator between table and field in index store names.
pub const NAME_SEPARATOR: char = '\u{1E}';
