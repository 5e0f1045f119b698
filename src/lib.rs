//! A hash table with separate chaining and load-factor-driven growth.

pub mod config;
pub mod error;
pub mod hash_table;

pub use config::HashTableConfig;
pub use error::HashTableError;
pub use hash_table::HashTable;
