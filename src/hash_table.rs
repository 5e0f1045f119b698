//! A separately chained hash table.
//!
//! Each bucket is a `Vec` of entries kept in insertion order. A key lands in bucket
//! `hash(key) % bucket_count`, and collisions are resolved by a linear scan of that
//! bucket using the key's `Eq`. The bucket array doubles whenever an insert finds the
//! table at or above its load factor, and it never shrinks.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::mem;
use std::slice;
use std::time::Instant;
use std::vec;

use log::{debug, trace};

use crate::config::HashTableConfig;
use crate::error::HashTableError;

#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

type Bucket<K, V> = Vec<Entry<K, V>>;

fn empty_buckets<K, V>(bucket_count: usize) -> Vec<Bucket<K, V>> {
    let mut buckets: Vec<Bucket<K, V>> = Vec::with_capacity(bucket_count);
    buckets.resize_with(bucket_count, Vec::new);
    buckets
}

#[derive(Clone)]
pub struct HashTable<K, V> {
    count: usize,
    config: HashTableConfig,
    buckets: Vec<Bucket<K, V>>,
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table with 16 buckets and a 0.75 load factor.
    pub fn new() -> Self {
        let config: HashTableConfig = HashTableConfig::default();
        HashTable {
            count: 0,
            buckets: empty_buckets(config.initial_bucket_count),
            config,
        }
    }

    pub fn with_config(config: HashTableConfig) -> Result<Self, HashTableError> {
        config.validate()?;
        Ok(HashTable {
            count: 0,
            buckets: empty_buckets(config.initial_bucket_count),
            config,
        })
    }

    pub fn config(&self) -> &HashTableConfig {
        &self.config
    }

    /// Number of key-value pairs stored in the table.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.bucket_count() as f64
    }

    /// Drops every entry and goes back to the initial bucket count.
    pub fn clear(&mut self) {
        trace!(
            "clearing {} entries from {} buckets",
            self.count,
            self.bucket_count()
        );
        self.buckets = empty_buckets(self.config.initial_bucket_count);
        self.count = 0;
    }

    /// Iterates over every `(key, value)` pair, bucket by bucket, and within a bucket in
    /// insertion order. The order depends on the hashes and carries no other meaning.
    pub fn entries(&self) -> Entries<'_, K, V> {
        Entries {
            buckets: self.buckets.iter(),
            current: None,
            remaining: self.count,
        }
    }

    /// Same order as [`HashTable::entries`].
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.entries(),
        }
    }

    /// Same order as [`HashTable::entries`].
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.entries(),
        }
    }

    /// Same order as [`HashTable::entries`].
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            buckets: self.buckets.iter_mut(),
            current: None,
            remaining: self.count,
        }
    }

    /// Is the load factor greater than or equal to the configured maximum?
    fn should_grow(&self) -> bool {
        self.count as f64 >= self.bucket_count() as f64 * self.config.max_load_factor
    }
}

impl<K, V> HashTable<K, V>
where
    K: Hash + Eq,
{
    fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let mut hasher: DefaultHasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.bucket_count() as u64) as usize
    }

    /// Inserts `value` under `key`, growing the table first if it is at its load factor.
    ///
    /// An existing entry keeps its position in the bucket and only has its value
    /// replaced; the previous value is returned in that case.
    ///
    /// If a key's `Hash` panics while the table is growing, the entries not yet moved to
    /// the new buckets are dropped. `len` still matches the entries that remain.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        if self.should_grow() {
            let old_bucket_count: usize = self.bucket_count();
            let now: Instant = Instant::now();
            self.grow();
            debug!(
                "grew from {} to {} buckets, rehashed {} entries in {:?}",
                old_bucket_count,
                self.bucket_count(),
                self.count,
                now.elapsed()
            );
        }
        match self.emplace(key, value) {
            Some(x) => Some(x),
            None => {
                self.count += 1;
                None
            }
        }
    }

    /// Finds or appends the entry for `key` without checking the load factor. Does not
    /// touch `count`.
    fn emplace(&mut self, key: K, value: V) -> Option<V> {
        let h: usize = self.bucket_index(&key);
        let bucket: &mut Bucket<K, V> = &mut self.buckets[h];
        for entry in bucket.iter_mut() {
            if entry.key == key {
                return Some(mem::replace(&mut entry.value, value));
            }
        }
        bucket.push(Entry { key, value });
        None
    }

    /// Doubles the bucket count until the current entries sit below the load factor,
    /// then rehashes every entry once into the new layout.
    fn grow(&mut self) {
        let lf: f64 = self.config.max_load_factor;
        let mut new_bucket_count: usize = self.bucket_count() * 2;
        while self.count as f64 >= new_bucket_count as f64 * lf {
            new_bucket_count *= 2;
        }
        let old_buckets: Vec<Bucket<K, V>> =
            mem::replace(&mut self.buckets, empty_buckets(new_bucket_count));
        self.count = 0;
        for entry in old_buckets.into_iter().flatten() {
            debug_assert!(
                !self.should_grow(),
                "load factor crossed while rehashing into {} buckets",
                new_bucket_count
            );
            let replaced: Option<V> = self.emplace(entry.key, entry.value);
            debug_assert!(replaced.is_none(), "duplicate key found while rehashing");
            self.count += 1;
        }
        debug_assert!(!self.should_grow());
    }

    fn find<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let h: usize = self.bucket_index(key);
        self.buckets[h].iter().find(|entry| entry.key.borrow() == key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(|entry| &entry.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let h: usize = self.bucket_index(key);
        self.buckets[h]
            .iter_mut()
            .find(|entry| entry.key.borrow() == key)
            .map(|entry| &mut entry.value)
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes the entry for `key` and returns its value. The remaining entries of the
    /// bucket keep their relative order. The bucket array is never shrunk.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let h: usize = self.bucket_index(key);
        let bucket: &mut Bucket<K, V> = &mut self.buckets[h];
        let position: usize = bucket.iter().position(|entry| entry.key.borrow() == key)?;
        let entry: Entry<K, V> = bucket.remove(position);
        self.count -= 1;
        Some(entry.value)
    }
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for HashTable<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

impl<K, V> Extend<(K, V)> for HashTable<K, V>
where
    K: Hash + Eq,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HashTable<K, V>
where
    K: Hash + Eq,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table: HashTable<K, V> = HashTable::new();
        table.extend(iter);
        table
    }
}

impl<'a, K, V> IntoIterator for &'a HashTable<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Entries<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K, V> IntoIterator for HashTable<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.count,
            buckets: self.buckets.into_iter(),
            current: None,
        }
    }
}

/// Borrowing iterator over the pairs of a [`HashTable`], see [`HashTable::entries`].
#[derive(Clone)]
pub struct Entries<'a, K, V> {
    buckets: slice::Iter<'a, Bucket<K, V>>,
    current: Option<slice::Iter<'a, Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.as_mut().and_then(|bucket| bucket.next()) {
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
            self.current = Some(self.buckets.next()?.iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {}
impl<K, V> FusedIterator for Entries<'_, K, V> {}

/// Keys of a [`HashTable`], in the order of [`HashTable::entries`].
#[derive(Clone)]
pub struct Keys<'a, K, V> {
    inner: Entries<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Values of a [`HashTable`], in the order of [`HashTable::entries`].
#[derive(Clone)]
pub struct Values<'a, K, V> {
    inner: Entries<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Mutable values of a [`HashTable`], in the order of [`HashTable::entries`].
pub struct ValuesMut<'a, K, V> {
    buckets: slice::IterMut<'a, Bucket<K, V>>,
    current: Option<slice::IterMut<'a, Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.as_mut().and_then(|bucket| bucket.next()) {
                self.remaining -= 1;
                return Some(&mut entry.value);
            }
            self.current = Some(self.buckets.next()?.iter_mut());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Owning iterator, yields pairs in the same order as [`HashTable::entries`].
pub struct IntoIter<K, V> {
    buckets: vec::IntoIter<Bucket<K, V>>,
    current: Option<vec::IntoIter<Entry<K, V>>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.as_mut().and_then(|bucket| bucket.next()) {
                self.remaining -= 1;
                return Some((entry.key, entry.value));
            }
            self.current = Some(self.buckets.next()?.into_iter());
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .is_test(true)
            .try_init();
    }

    /// Returns `n` keys that all hash into the same bucket of `table`.
    fn colliding_keys(table: &HashTable<usize, usize>, n: usize) -> Vec<usize> {
        let target: usize = table.bucket_index(&0usize);
        (0usize..)
            .filter(|k| table.bucket_index(k) == target)
            .take(n)
            .collect()
    }

    fn total_entries(table: &HashTable<usize, usize>) -> usize {
        table.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    #[test]
    fn fresh_table_has_sixteen_empty_buckets() {
        let table: HashTable<usize, usize> = HashTable::new();
        assert_eq!(table.bucket_count(), 16);
        assert!(table.buckets.iter().all(|bucket| bucket.is_empty()));
        assert_eq!(table.len(), 0);
        assert_eq!(table.load_factor(), 0.0);
    }

    #[test]
    fn grows_on_thirteenth_distinct_key() {
        init_test_logger();
        let mut table: HashTable<usize, usize> = HashTable::new();
        for i in 0..12 {
            table.set(i, i * 10);
            assert_eq!(table.bucket_count(), 16);
        }
        table.set(12, 120);
        assert_eq!(table.bucket_count(), 32);
        assert_eq!(table.len(), 13);
        assert_eq!(total_entries(&table), 13);
        for i in 0..13 {
            assert_eq!(table.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn overwrite_at_threshold_still_grows() {
        let mut table: HashTable<usize, usize> = HashTable::new();
        for i in 0..12 {
            table.set(i, i);
        }
        // The load factor is checked before the key is looked up.
        assert_eq!(table.set(0, 100), Some(0));
        assert_eq!(table.bucket_count(), 32);
        assert_eq!(table.len(), 12);
    }

    #[test]
    fn grow_rehashes_into_new_layout() {
        let mut table: HashTable<usize, usize> = HashTable::new();
        for i in 0..100 {
            table.set(i, i);
        }
        assert_eq!(table.bucket_count(), 256);
        assert_eq!(total_entries(&table), 100);
        for (h, bucket) in table.buckets.iter().enumerate() {
            for entry in bucket {
                assert_eq!(table.bucket_index(&entry.key), h);
            }
        }
    }

    #[test]
    fn remove_keeps_bucket_order() {
        let mut table: HashTable<usize, usize> = HashTable::new();
        let keys: Vec<usize> = colliding_keys(&table, 4);
        for &k in &keys {
            table.set(k, k + 1);
        }
        let h: usize = table.bucket_index(&keys[0]);
        assert_eq!(table.buckets[h].len(), 4);

        assert_eq!(table.remove(&keys[1]), Some(keys[1] + 1));
        let remaining: Vec<usize> = table.buckets[h].iter().map(|entry| entry.key).collect();
        assert_eq!(remaining, vec![keys[0], keys[2], keys[3]]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn overwrite_keeps_bucket_position() {
        let mut table: HashTable<usize, usize> = HashTable::new();
        let keys: Vec<usize> = colliding_keys(&table, 3);
        for &k in &keys {
            table.set(k, 0);
        }
        assert_eq!(table.set(keys[0], 7), Some(0));
        let h: usize = table.bucket_index(&keys[0]);
        assert_eq!(table.buckets[h][0].key, keys[0]);
        assert_eq!(table.buckets[h][0].value, 7);
    }

    #[test]
    fn entries_follow_bucket_then_insertion_order() {
        let mut table: HashTable<usize, usize> = HashTable::new();
        for i in (0..40).rev() {
            table.set(i * 7, i);
        }
        let expected: Vec<usize> = table
            .buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|entry| entry.key))
            .collect();
        let keys: Vec<usize> = table.keys().copied().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn remove_never_shrinks() {
        let mut table: HashTable<usize, usize> = HashTable::new();
        for i in 0..50 {
            table.set(i, i);
        }
        let grown: usize = table.bucket_count();
        for i in 0..50 {
            table.remove(&i);
        }
        assert!(table.is_empty());
        assert_eq!(table.bucket_count(), grown);
    }

    #[test]
    fn small_configs_keep_up_with_inserts() {
        init_test_logger();
        for initial_bucket_count in [1, 2, 3] {
            for max_load_factor in [0.01, 0.25, 0.5, 1.0] {
                let config: HashTableConfig = HashTableConfig {
                    initial_bucket_count,
                    max_load_factor,
                };
                let mut table: HashTable<usize, usize> = HashTable::with_config(config).unwrap();
                for i in 0..300 {
                    table.set(i, i * 2);
                    assert_eq!(table.len(), i + 1);
                    assert_eq!(total_entries(&table), table.len());
                    assert!(table.load_factor() <= 1.0);
                }
                for i in 0..300 {
                    assert_eq!(
                        table.get(&i),
                        Some(&(i * 2)),
                        "missing {} with {:?}",
                        i,
                        config
                    );
                }
            }
        }
    }

    #[test]
    fn tiny_load_factor_grows_past_one_doubling() {
        let config: HashTableConfig = HashTableConfig {
            initial_bucket_count: 1,
            max_load_factor: 0.25,
        };
        let mut table: HashTable<usize, usize> = HashTable::with_config(config).unwrap();
        table.set(0, 0);
        assert_eq!(table.bucket_count(), 1);
        // One entry needs at least 8 buckets to sit below a 0.25 load factor.
        table.set(1, 1);
        assert_eq!(table.bucket_count(), 8);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn clear_restores_configured_bucket_count() {
        let config: HashTableConfig = HashTableConfig {
            initial_bucket_count: 4,
            max_load_factor: 1.0,
        };
        let mut table: HashTable<usize, usize> = HashTable::with_config(config).unwrap();
        for i in 0..4 {
            table.set(i, i);
        }
        assert_eq!(table.bucket_count(), 4);
        table.set(4, 4);
        assert_eq!(table.bucket_count(), 8);

        table.clear();
        assert_eq!(table.bucket_count(), 4);
        assert_eq!(total_entries(&table), 0);
    }
}
