//! Thread-safe memoisation of lookup tables.
//!
//! Tables are immutable once built and never evicted, so handing out
//! `Arc<[T]>` clones lets callers use a table after the lock is released.
//!
//! ```rust
//! use dcp_transfer::{LutCache, LutKey, TransferFunction};
//!
//! let cache: LutCache<f64> = LutCache::new();
//! let key = LutKey::new(TransferFunction::Identity, 0.0, 1.0, 4, false, 1);
//! let lut = cache.get_or_create(key, || vec![0.0; 16]);
//! assert_eq!(lut.len(), 16);
//! assert_eq!(cache.len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::TransferFunction;

/// Hashable identity of one table.
///
/// Floating-point parameters are compared by bit pattern so that the key is
/// `Eq + Hash`; two functions that print the same but differ in the last bit
/// get separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LutKey {
    function: [u64; 5],
    from: u64,
    to: u64,
    bit_depth: u32,
    inverse: bool,
    scale: i32,
}

impl LutKey {
    /// Creates a key for `function` sampled over `[from, to]`.
    pub fn new(
        function: TransferFunction,
        from: f64,
        to: f64,
        bit_depth: u32,
        inverse: bool,
        scale: i32,
    ) -> Self {
        Self {
            function: function_bits(&function),
            from: from.to_bits(),
            to: to.to_bits(),
            bit_depth,
            inverse,
            scale,
        }
    }
}

fn function_bits(f: &TransferFunction) -> [u64; 5] {
    match *f {
        TransferFunction::Identity => [0, 0, 0, 0, 0],
        TransferFunction::Gamma(g) => [1, g.to_bits(), 0, 0, 0],
        TransferFunction::ModifiedGamma {
            power,
            threshold,
            a,
            b,
        } => [
            2,
            power.to_bits(),
            threshold.to_bits(),
            a.to_bits(),
            b.to_bits(),
        ],
        TransferFunction::SGamut3 => [3, 0, 0, 0, 0],
    }
}

/// Thread-safe table cache.
///
/// A table is built at most once per key: the builder runs while the write
/// lock is held.
#[derive(Debug)]
pub struct LutCache<T> {
    tables: RwLock<HashMap<LutKey, Arc<[T]>>>,
}

impl<T> Default for LutCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LutCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the table for `key`, building it with `build` on first use.
    pub fn get_or_create<F>(&self, key: LutKey, build: F) -> Arc<[T]>
    where
        F: FnOnce() -> Vec<T>,
    {
        // Fast path
        {
            let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(t) = tables.get(&key) {
                return Arc::clone(t);
            }
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            tables
                .entry(key)
                .or_insert_with(|| Arc::from(build().into_boxed_slice())),
        )
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn cache_hit() {
        let cache: LutCache<i32> = LutCache::new();
        let key = LutKey::new(TransferFunction::Gamma(2.2), 0.0, 1.0, 8, false, 4095);
        let a = cache.get_or_create(key, || vec![1; 256]);
        let b = cache.get_or_create(key, || vec![2; 256]);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b[0], 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_distinguish_parameters() {
        let a = LutKey::new(TransferFunction::Gamma(2.2), 0.0, 1.0, 8, false, 1);
        let b = LutKey::new(TransferFunction::Gamma(2.4), 0.0, 1.0, 8, false, 1);
        let c = LutKey::new(TransferFunction::Gamma(2.2), 0.0, 1.0, 8, true, 1);
        let d = LutKey::new(TransferFunction::Gamma(2.2), 0.0, 0.5, 8, false, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn thread_safe_single_build() {
        use std::thread;

        let cache = Arc::new(LutCache::<f64>::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let key = LutKey::new(TransferFunction::SGamut3, 0.0, 1.0, 10, true, 1);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    for _ in 0..10 {
                        cache.get_or_create(key, || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            vec![0.5; 1024]
                        });
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }
}
