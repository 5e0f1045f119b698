use crate::error::HashTableError;

/// Layout parameters for a [`HashTable`](crate::hash_table::HashTable).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashTableConfig {
    /// Number of buckets allocated on construction and restored by `clear`.
    pub initial_bucket_count: usize,
    /// The table doubles before an insert once `count >= bucket_count * max_load_factor`.
    pub max_load_factor: f64,
}

impl HashTableConfig {
    pub const DEFAULT_BUCKET_COUNT: usize = 16;
    pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

    pub fn validate(&self) -> Result<(), HashTableError> {
        if self.initial_bucket_count == 0 {
            return Err(HashTableError::ZeroBucketCount);
        }
        let lf: f64 = self.max_load_factor;
        if !lf.is_finite() || lf <= 0.0 || lf > 1.0 {
            return Err(HashTableError::InvalidLoadFactor { load_factor: lf });
        }
        Ok(())
    }
}

impl Default for HashTableConfig {
    fn default() -> Self {
        Self {
            initial_bucket_count: Self::DEFAULT_BUCKET_COUNT,
            max_load_factor: Self::DEFAULT_LOAD_FACTOR,
        }
    }
}
