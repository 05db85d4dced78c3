//! # Encoding Module
//!
//! Byte-level codecs for field values:
//!
//! - **Canonical encoding**: the fixed-width, order-preserving form stored in
//!   record blobs and compared inside indexes
//! - **Index key form**: the canonical form with variable-width values
//!   length-prefixed, safe to compose with the index separator byte

pub mod value;

pub use value::{decode_value, encode_index_key, encode_value, encode_value_into};
