//! Separate-chaining hash table backend.
//!
//! Buckets hold singly linked record chains; new keys append at the chain
//! tail, existing keys overwrite in place. The table starts at 32 buckets
//! and doubles when the load factor (records per bucket) reaches 3/4,
//! redistributing every record into the grown bucket array. Iteration walks
//! buckets in ascending index and each chain front to back; the resulting
//! order depends on hashes and insertion history and is not deterministic
//! in any useful sense.
//!
//! Keys hash through the table's hasher and compare through its key
//! comparator; both default to the value algebra's own routines.

use tracing::debug;

use crate::value;
use crate::value::{Handlers, OpaqueCmp, OpaqueHasher, Value};

const INITIAL_BUCKETS: usize = 32;

pub(crate) struct Record {
    pub(crate) k: Value,
    pub(crate) v: Value,
    pub(crate) next: Option<Box<Record>>,
}

pub(crate) struct HashTable {
    buckets: Vec<Option<Box<Record>>>,
    records: usize,
    pub(crate) hasher: Option<OpaqueHasher>,
    pub(crate) key_cmp: Option<OpaqueCmp>,
}

impl HashTable {
    pub(crate) fn new() -> Self {
        let mut buckets = Vec::with_capacity(INITIAL_BUCKETS);
        buckets.resize_with(INITIAL_BUCKETS, || None);
        HashTable {
            buckets,
            records: 0,
            hasher: None,
            key_cmp: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn bucket(&self, i: usize) -> Option<&Record> {
        self.buckets[i].as_deref()
    }

    fn bucket_index(&self, k: &Value) -> usize {
        (value::hash(k, self.hasher) as usize) % self.buckets.len()
    }

    /// Chain position of `k` in its bucket, if present.
    fn find(&self, k: &Value) -> (usize, Option<usize>) {
        let idx = self.bucket_index(k);
        let mut pos = 0;
        let mut cur = self.buckets[idx].as_deref();
        while let Some(rec) = cur {
            if value::compare(&rec.k, k, self.key_cmp).is_eq() {
                return (idx, Some(pos));
            }
            pos += 1;
            cur = rec.next.as_deref();
        }
        (idx, None)
    }

    /// Inserts or overwrites. Displaced key/value payloads of an existing
    /// entry are released through `handlers` when `owns` is set. Only a
    /// genuine insertion counts against the load factor; an overwrite
    /// never grows the table.
    pub(crate) fn put(&mut self, k: Value, v: Value, handlers: &Handlers, owns: bool) {
        let (idx, found) = self.find(&k);
        match found {
            Some(pos) => {
                let mut cur = self.buckets[idx].as_deref_mut();
                for _ in 0..pos {
                    let Some(rec) = cur else { return };
                    cur = rec.next.as_deref_mut();
                }
                if let Some(rec) = cur {
                    if owns {
                        rec.k.release(handlers);
                        rec.v.release(handlers);
                    }
                    rec.k = k;
                    rec.v = v;
                }
            }
            None => {
                let idx = if 4 * (self.records + 1) >= 3 * self.buckets.len() {
                    self.rehash();
                    self.bucket_index(&k)
                } else {
                    idx
                };
                let fresh = Box::new(Record { k, v, next: None });
                let mut slot = &mut self.buckets[idx];
                while let Some(rec) = slot {
                    slot = &mut rec.next;
                }
                *slot = Some(fresh);
                self.records += 1;
            }
        }
    }

    pub(crate) fn get(&self, k: &Value) -> Option<&Value> {
        let (idx, found) = self.find(k);
        let pos = found?;
        let mut cur = self.buckets[idx].as_deref();
        for _ in 0..pos {
            cur = cur?.next.as_deref();
        }
        cur.map(|rec| &rec.v)
    }

    pub(crate) fn has_key(&self, k: &Value) -> bool {
        self.find(k).1.is_some()
    }

    /// Unlinks the record for `k` and returns its value. The displaced key
    /// is released when `owns` is set; the value is handed to the caller.
    pub(crate) fn pop(&mut self, k: &Value, handlers: &Handlers, owns: bool) -> Option<Value> {
        let (idx, found) = self.find(k);
        let pos = found?;
        let removed = if pos == 0 {
            let mut head = self.buckets[idx].take()?;
            self.buckets[idx] = head.next.take();
            head
        } else {
            let mut cur = self.buckets[idx].as_deref_mut()?;
            for _ in 0..pos - 1 {
                cur = cur.next.as_deref_mut()?;
            }
            let mut removed = cur.next.take()?;
            cur.next = removed.next.take();
            removed
        };
        self.records -= 1;
        if owns {
            removed.k.release(handlers);
        }
        Some(removed.v)
    }

    /// Drops every record, releasing payloads when `owns` is set. Bucket
    /// count is kept.
    pub(crate) fn clear(&mut self, handlers: &Handlers, owns: bool) {
        for slot in &mut self.buckets {
            let mut chain = slot.take();
            while let Some(mut rec) = chain {
                if owns {
                    rec.k.release(handlers);
                    rec.v.release(handlers);
                }
                chain = rec.next.take();
            }
        }
        self.records = 0;
    }

    /// Doubles the bucket array and redistributes every record, preserving
    /// each chain's relative order within its new bucket.
    fn rehash(&mut self) {
        let grown = self.buckets.len() * 2;
        debug!(
            records = self.records,
            from = self.buckets.len(),
            to = grown,
            "hash table rehash"
        );
        let old = std::mem::take(&mut self.buckets);
        self.buckets.resize_with(grown, || None);
        for slot in old {
            let mut chain = slot;
            while let Some(mut rec) = chain {
                chain = rec.next.take();
                let idx = self.bucket_index(&rec.k);
                let mut tail = &mut self.buckets[idx];
                while let Some(existing) = tail {
                    tail = &mut existing.next;
                }
                *tail = Some(rec);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(t: &mut HashTable, k: Value, v: Value) {
        t.put(k, v, &Handlers::default(), false);
    }

    #[test]
    fn test_put_get_overwrite() {
        let mut t = HashTable::new();
        put(&mut t, Value::Int(1), Value::str("one"));
        put(&mut t, Value::str("k"), Value::Int(2));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(&Value::Int(1)), Some(&Value::str("one")));

        put(&mut t, Value::Int(1), Value::str("uno"));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(&Value::Int(1)), Some(&Value::str("uno")));
        assert!(t.get(&Value::Int(2)).is_none());
    }

    #[test]
    fn test_numeric_key_identity() {
        // Int(5), Size(5) and Real(5.0) are one key
        let mut t = HashTable::new();
        put(&mut t, Value::Int(5), Value::str("a"));
        put(&mut t, Value::Real(5.0), Value::str("b"));
        put(&mut t, Value::Size(5), Value::str("c"));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(&Value::Int(5)), Some(&Value::str("c")));
    }

    #[test]
    fn test_pop() {
        let mut t = HashTable::new();
        for i in 0..10 {
            put(&mut t, Value::Int(i), Value::Int(i * i));
        }
        assert_eq!(
            t.pop(&Value::Int(3), &Handlers::default(), false),
            Some(Value::Int(9))
        );
        assert_eq!(t.pop(&Value::Int(3), &Handlers::default(), false), None);
        assert_eq!(t.len(), 9);
        assert!(!t.has_key(&Value::Int(3)));
        assert!(t.has_key(&Value::Int(4)));
    }

    #[test]
    fn test_rehash_growth_keeps_entries() {
        let mut t = HashTable::new();
        let n = 500;
        for i in 0..n {
            put(&mut t, Value::Int(i), Value::Int(-i));
        }
        assert_eq!(t.len(), n as usize);
        assert!(t.bucket_count() > INITIAL_BUCKETS);
        // load factor stays under 3/4
        assert!(4 * t.len() < 3 * t.bucket_count());
        for i in 0..n {
            assert_eq!(t.get(&Value::Int(i)), Some(&Value::Int(-i)));
        }
    }

    #[test]
    fn test_overwrite_at_threshold_does_not_grow() {
        let mut t = HashTable::new();
        // one short of the 3/4 growth trigger for 32 buckets
        for i in 0..23 {
            put(&mut t, Value::Int(i), Value::Null);
        }
        assert_eq!(t.bucket_count(), INITIAL_BUCKETS);

        put(&mut t, Value::Int(0), Value::Int(1));
        assert_eq!(t.len(), 23);
        assert_eq!(t.bucket_count(), INITIAL_BUCKETS);
        assert_eq!(t.get(&Value::Int(0)), Some(&Value::Int(1)));

        // the next genuine insertion grows
        put(&mut t, Value::Int(100), Value::Null);
        assert_eq!(t.len(), 24);
        assert_eq!(t.bucket_count(), 2 * INITIAL_BUCKETS);
    }

    #[test]
    fn test_clear() {
        let mut t = HashTable::new();
        for i in 0..100 {
            put(&mut t, Value::Int(i), Value::Null);
        }
        t.clear(&Handlers::default(), false);
        assert_eq!(t.len(), 0);
        assert!(!t.has_key(&Value::Int(7)));
    }

    #[test]
    fn test_destroyer_runs_on_owned_overwrite() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DESTROYED: AtomicUsize = AtomicUsize::new(0);
        fn destroy(_p: usize) {
            DESTROYED.fetch_add(1, Ordering::Relaxed);
        }
        let handlers = Handlers {
            destroy: Some(destroy),
            ..Handlers::default()
        };
        let mut t = HashTable::new();
        t.put(Value::Int(1), Value::Ptr(0xa), &handlers, true);
        t.put(Value::Int(1), Value::Ptr(0xb), &handlers, true);
        assert_eq!(DESTROYED.load(Ordering::Relaxed), 1);
        t.clear(&handlers, true);
        assert_eq!(DESTROYED.load(Ordering::Relaxed), 2);
    }
}
