//! The dict: one associative interface over interchangeable backends.
//!
//! A dict is created against a concrete backend (plain search tree,
//! red-black search tree, or hash table) or against the process-wide
//! default. The backend fixes performance characteristics and iteration
//! order (ascending keys for the trees, unspecified for the hash table);
//! the observable key/value semantics are identical across all three.
//!
//! Dispatch is a closed enum with exhaustive `match`; there is exactly one
//! backend set, known at compile time.
//!
//! # Ownership
//!
//! A dict holds its entries by shallow reference. `take_data_ownership`
//! marks it the owner: displaced or torn-down entries then run the user
//! destroyer on their opaque `Ptr` payloads. Deep copies own their data,
//! shallow copies do not.

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};

use tracing::debug;

use crate::bst::{Balancing, NIL, SearchTree};
use crate::htbl::{HashTable, Record};
use crate::serialize;
use crate::value;
use crate::value::{Handlers, OpaqueCmp, OpaqueHasher, Value};

/// Dict backend selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Backend {
    /// Unbalanced binary search tree. Ordered iteration, degenerates
    /// under sorted insertion.
    BstPlain = 0,
    /// Red-black balanced search tree. Ordered iteration, logarithmic
    /// height guarantee.
    BstRb = 1,
    /// Separate-chaining hash table. Fast point operations, unspecified
    /// iteration order.
    Htbl = 2,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::BstPlain => "bst-plain",
            Backend::BstRb => "bst-rb",
            Backend::Htbl => "htbl",
        }
    }
}

static DEFAULT_BACKEND: AtomicU8 = AtomicU8::new(Backend::BstPlain as u8);

/// Sets the backend used by [`Dict::new`] (and the parser) from this point
/// on. Intended to be called once, before dicts are created.
pub fn set_default_backend(backend: Backend) {
    debug!(backend = backend.name(), "default dict backend changed");
    DEFAULT_BACKEND.store(backend as u8, AtomicOrdering::Relaxed);
}

/// The backend currently used by [`Dict::new`].
pub fn default_backend() -> Backend {
    match DEFAULT_BACKEND.load(AtomicOrdering::Relaxed) {
        0 => Backend::BstPlain,
        1 => Backend::BstRb,
        _ => Backend::Htbl,
    }
}

enum BackendState {
    Htbl(HashTable),
    Bst(SearchTree),
}

/// Associative container over [`Value`] keys and values.
pub struct Dict {
    state: BackendState,
    handlers: Handlers,
    owns_data: bool,
}

impl Dict {
    /// Creates an empty dict on the process default backend.
    pub fn new() -> Self {
        Dict::with_backend(default_backend())
    }

    /// Creates an empty dict on the given backend.
    pub fn with_backend(backend: Backend) -> Self {
        let state = match backend {
            Backend::BstPlain => BackendState::Bst(SearchTree::new(Balancing::Plain)),
            Backend::BstRb => BackendState::Bst(SearchTree::new(Balancing::RedBlack)),
            Backend::Htbl => BackendState::Htbl(HashTable::new()),
        };
        Dict {
            state,
            handlers: Handlers::default(),
            owns_data: false,
        }
    }

    pub fn backend(&self) -> Backend {
        match &self.state {
            BackendState::Htbl(_) => Backend::Htbl,
            BackendState::Bst(t) => match t.balancing() {
                Balancing::Plain => Backend::BstPlain,
                Balancing::RedBlack => Backend::BstRb,
            },
        }
    }

    /// Marks this dict the owner of its entries: displaced or torn-down
    /// opaque payloads will run the user destroyer.
    pub fn take_data_ownership(&mut self) {
        self.owns_data = true;
    }

    pub fn drop_data_ownership(&mut self) {
        self.owns_data = false;
    }

    pub fn owns_data(&self) -> bool {
        self.owns_data
    }

    pub fn set_comparator(&mut self, f: OpaqueCmp) {
        self.handlers.cmp = Some(f);
    }

    pub fn set_copier(&mut self, f: value::OpaqueCopy) {
        self.handlers.copy = Some(f);
    }

    pub fn set_destroyer(&mut self, f: value::OpaqueDestroy) {
        self.handlers.destroy = Some(f);
    }

    pub fn set_serializer(&mut self, f: value::OpaqueSerialize) {
        self.handlers.serialize = Some(f);
    }

    /// Installs the key hasher.
    ///
    /// # Panics
    /// On tree backends, which never hash.
    pub fn set_hasher(&mut self, f: OpaqueHasher) {
        match &mut self.state {
            BackendState::Htbl(t) => t.hasher = Some(f),
            BackendState::Bst(_) => panic!("hasher is only meaningful for the hash table backend"),
        }
    }

    /// Installs the hash table's key equality comparator.
    ///
    /// # Panics
    /// On tree backends; use [`Dict::set_comparator`] there.
    pub fn set_key_comparator(&mut self, f: OpaqueCmp) {
        match &mut self.state {
            BackendState::Htbl(t) => t.key_cmp = Some(f),
            BackendState::Bst(_) => {
                panic!("key comparator is only meaningful for the hash table backend")
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.state {
            BackendState::Htbl(t) => t.len(),
            BackendState::Bst(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts or overwrites. An overwritten entry's payloads are released
    /// when the dict owns its data.
    pub fn put(&mut self, k: Value, v: Value) {
        let handlers = self.handlers;
        let owns = self.owns_data;
        match &mut self.state {
            BackendState::Htbl(t) => t.put(k, v, &handlers, owns),
            BackendState::Bst(t) => t.put(k, v, handlers.cmp, &handlers, owns),
        }
    }

    /// Looks up `k`, returning a shallow copy of its value, or `default`
    /// when absent.
    pub fn get(&self, k: &Value, default: Value) -> Value {
        match &self.state {
            BackendState::Htbl(t) => t.get(k).cloned().unwrap_or(default),
            BackendState::Bst(t) => {
                let i = t.find(k, self.handlers.cmp);
                if i == NIL { default } else { t.value(i).clone() }
            }
        }
    }

    /// Removes `k`, returning its value, or `default` when absent. The
    /// removed key's payload is released when the dict owns its data.
    pub fn pop(&mut self, k: &Value, default: Value) -> Value {
        let handlers = self.handlers;
        let owns = self.owns_data;
        let popped = match &mut self.state {
            BackendState::Htbl(t) => t.pop(k, &handlers, owns),
            BackendState::Bst(t) => t.pop(k, handlers.cmp, &handlers, owns),
        };
        popped.unwrap_or(default)
    }

    pub fn has_key(&self, k: &Value) -> bool {
        match &self.state {
            BackendState::Htbl(t) => t.has_key(k),
            BackendState::Bst(t) => t.find(k, self.handlers.cmp) != NIL,
        }
    }

    /// Removes every entry, releasing payloads when the dict owns its data.
    pub fn clear(&mut self) {
        let handlers = self.handlers;
        let owns = self.owns_data;
        match &mut self.state {
            BackendState::Htbl(t) => t.clear(&handlers, owns),
            BackendState::Bst(t) => t.clear(&handlers, owns),
        }
    }

    /// Tree height of a search tree backend.
    ///
    /// # Panics
    /// On the hash table backend.
    pub fn height(&self) -> usize {
        match &self.state {
            BackendState::Bst(t) => t.height(),
            BackendState::Htbl(_) => panic!("height is only meaningful for tree backends"),
        }
    }

    /// Detached snapshot of the keys, in iteration order.
    pub fn keys(&self) -> Vec<Value> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Detached snapshot of the values, in iteration order.
    pub fn values(&self) -> Vec<Value> {
        self.iter().map(|(_, v)| v).collect()
    }

    /// Detached snapshot of the entries, in iteration order.
    pub fn items(&self) -> Vec<(Value, Value)> {
        self.iter().collect()
    }

    pub fn iter(&self) -> DictIter<'_> {
        DictIter::new(self)
    }

    /// Shallow copy: same backend, same handlers, entries shared by
    /// reference. The copy does not own its data.
    pub fn copy(&self) -> Dict {
        self.copy_impl(false, 0)
    }

    /// Deep copy: entries are reconstructed recursively with this dict's
    /// handler set. The copy owns its data.
    ///
    /// # Panics
    /// If an opaque payload is reached without a copy handler, or nesting
    /// exceeds [`value::MAX_DEPTH`].
    pub fn deep_copy(&self) -> Dict {
        self.copy_impl(true, 0)
    }

    pub(crate) fn deep_copy_at(&self, depth: usize) -> Dict {
        self.copy_impl(true, depth)
    }

    fn copy_impl(&self, deep: bool, depth: usize) -> Dict {
        let mut out = Dict::with_backend(self.backend());
        out.handlers = self.handlers;
        out.owns_data = deep;
        if let (BackendState::Htbl(src), BackendState::Htbl(dst)) = (&self.state, &mut out.state) {
            dst.hasher = src.hasher;
            dst.key_cmp = src.key_cmp;
        }
        for (k, v) in self.iter() {
            if deep {
                out.put(
                    k.deep_copy_at(&self.handlers, depth + 1),
                    v.deep_copy_at(&self.handlers, depth + 1),
                );
            } else {
                out.put(k, v);
            }
        }
        out
    }

    /// Walks every entry by reference and runs the owner-side teardown
    /// hook with `handlers`. Used when an owning container holds this dict
    /// as a payload; entries are not removed.
    pub(crate) fn release_entries(&self, handlers: &Handlers) {
        match &self.state {
            BackendState::Htbl(t) => {
                let (mut bucket, mut rec) = first_record(t, 0);
                while let Some(r) = rec {
                    r.k.release(handlers);
                    r.v.release(handlers);
                    rec = match r.next.as_deref() {
                        Some(next) => Some(next),
                        None => {
                            let (b, next) = first_record(t, bucket + 1);
                            bucket = b;
                            next
                        }
                    };
                }
            }
            BackendState::Bst(t) => {
                let mut i = t.first();
                while i != NIL {
                    t.key(i).release(handlers);
                    t.value(i).release(handlers);
                    i = t.successor(i);
                }
            }
        }
    }

    /// Appends the canonical text form to `out`.
    pub fn serialize(&self, out: &mut String) {
        self.write_to(out, 0);
    }

    pub(crate) fn write_to(&self, out: &mut String, depth: usize) {
        out.push('{');
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            serialize::write_value_at(&k, out, &self.handlers, depth + 1);
            out.push_str(": ");
            serialize::write_value_at(&v, out, &self.handlers, depth + 1);
        }
        out.push('}');
    }
}

impl Default for Dict {
    fn default() -> Self {
        Dict::new()
    }
}

impl Drop for Dict {
    fn drop(&mut self) {
        if self.owns_data && self.handlers.destroy.is_some() {
            self.clear();
        }
    }
}

impl fmt::Display for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.serialize(&mut out);
        f.write_str(&out)
    }
}

impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dict[{}] {}", self.backend().name(), self)
    }
}

/// Orders two dicts.
///
/// Two tree-backed dicts walk in order in lockstep. Any comparison touching
/// a hash table sorts a detached snapshot of its entries by key first, so
/// the result never depends on bucket layout. Entries compare key first,
/// then value; a dict that is a strict prefix of the other is the lesser.
pub fn compare(a: &Dict, b: &Dict, cmp: Option<OpaqueCmp>) -> Ordering {
    if std::ptr::eq(a, b) {
        return Ordering::Equal;
    }
    match (&a.state, &b.state) {
        (BackendState::Bst(ta), BackendState::Bst(tb)) => {
            let mut i = ta.first();
            let mut j = tb.first();
            while i != NIL && j != NIL {
                let diff = value::compare(ta.key(i), tb.key(j), cmp)
                    .then_with(|| value::compare(ta.value(i), tb.value(j), cmp));
                if diff != Ordering::Equal {
                    return diff;
                }
                i = ta.successor(i);
                j = tb.successor(j);
            }
            match (i == NIL, j == NIL) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => unreachable!(),
            }
        }
        _ => {
            let xs = sorted_items(a, cmp);
            let ys = sorted_items(b, cmp);
            for ((ka, va), (kb, vb)) in xs.iter().zip(ys.iter()) {
                let diff = value::compare(ka, kb, cmp)
                    .then_with(|| value::compare(va, vb, cmp));
                if diff != Ordering::Equal {
                    return diff;
                }
            }
            xs.len().cmp(&ys.len())
        }
    }
}

// Tree iteration is already key-ascending; only hash table snapshots sort.
fn sorted_items(d: &Dict, cmp: Option<OpaqueCmp>) -> Vec<(Value, Value)> {
    let mut items = d.items();
    if matches!(d.state, BackendState::Htbl(_)) {
        items.sort_by(|(ka, _), (kb, _)| value::compare(ka, kb, cmp));
    }
    items
}

enum Cursor<'a> {
    Htbl {
        table: &'a HashTable,
        bucket: usize,
        rec: Option<&'a Record>,
    },
    Bst {
        tree: &'a SearchTree,
        node: usize,
    },
}

/// Cursor over a dict's entries, yielding shallow copies in the backend's
/// iteration order. Borrowing the dict for the cursor's lifetime rules out
/// mutation mid-iteration.
pub struct DictIter<'a> {
    remaining: usize,
    cursor: Cursor<'a>,
}

impl<'a> DictIter<'a> {
    fn new(dict: &'a Dict) -> Self {
        let cursor = match &dict.state {
            BackendState::Htbl(table) => {
                let (bucket, rec) = first_record(table, 0);
                Cursor::Htbl { table, bucket, rec }
            }
            BackendState::Bst(tree) => Cursor::Bst {
                tree,
                node: tree.first(),
            },
        };
        DictIter {
            remaining: dict.len(),
            cursor,
        }
    }

    pub fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Advances and returns the next entry.
    ///
    /// # Panics
    /// When the cursor is exhausted; guard with [`DictIter::has_next`] or
    /// use the `Iterator` impl.
    pub fn next_pair(&mut self) -> (Value, Value) {
        if self.remaining == 0 {
            panic!("dict iterator advanced past the last entry");
        }
        self.remaining -= 1;
        match &mut self.cursor {
            Cursor::Htbl { table, bucket, rec } => {
                let Some(cur) = *rec else {
                    unreachable!("remaining count outlived the record chain");
                };
                let pair = (cur.k.clone(), cur.v.clone());
                *rec = match cur.next.as_deref() {
                    Some(next) => Some(next),
                    None => {
                        let (b, r) = first_record(*table, *bucket + 1);
                        *bucket = b;
                        r
                    }
                };
                pair
            }
            Cursor::Bst { tree, node } => {
                let pair = (tree.key(*node).clone(), tree.value(*node).clone());
                *node = tree.successor(*node);
                pair
            }
        }
    }

    /// Rewinds the cursor to the first entry.
    pub fn reset(&mut self) {
        match &mut self.cursor {
            Cursor::Htbl { table, bucket, rec } => {
                let (b, r) = first_record(*table, 0);
                *bucket = b;
                *rec = r;
            }
            Cursor::Bst { tree, node } => *node = tree.first(),
        }
        self.remaining = match &self.cursor {
            Cursor::Htbl { table, .. } => table.len(),
            Cursor::Bst { tree, .. } => tree.len(),
        };
    }
}

fn first_record(table: &HashTable, from: usize) -> (usize, Option<&Record>) {
    for b in from..table.bucket_count() {
        if let Some(rec) = table.bucket(b) {
            return (b, Some(rec));
        }
    }
    (table.bucket_count(), None)
}

impl Iterator for DictIter<'_> {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            None
        } else {
            Some(self.next_pair())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for DictIter<'_> {}
