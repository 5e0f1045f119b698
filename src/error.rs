/// Errors raised while building a [`HashTable`](crate::hash_table::HashTable).
///
/// Table operations themselves never fail; a missing key is reported as `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HashTableError {
    #[error("initial bucket count must be at least 1")]
    ZeroBucketCount,

    #[error("max load factor must be in (0.0, 1.0], got {load_factor}")]
    InvalidLoadFactor { load_factor: f64 },
}
