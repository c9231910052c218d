//! The tagged value type and its algebra.
//!
//! `Value` is a closed sum over everything the library talks about: scalars,
//! strings, byte chunks, opaque pointers and the two composite payloads
//! (vector, dict). Composite and string payloads are reference counted, so
//! `Clone` is a *shallow* copy: the payload is shared, not duplicated. Use
//! [`Value::deep_copy`] to reconstruct composites recursively.
//!
//! # Ownership
//!
//! The library never interprets `Ptr` payloads itself. Containers carry an
//! ownership flag and a [`Handlers`] set; an owning container invokes the
//! user destroyer on `Ptr` payloads it displaces or tears down. Everything
//! else is released by ordinary `Drop`.
//!
//! # Contract violations
//!
//! Accessing a value through the wrong discriminant, hashing a composite
//! without an explicit hasher, or deep-copying a `Ptr` without a copy
//! handler are caller bugs and panic with a diagnostic. Malformed *data*
//! (e.g. unparsable text) is reported through `Result` instead, see
//! [`crate::parse`].

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::rc::Rc;

use crate::dict::Dict;

/// Maximum nesting depth for recursive operations over composite values
/// (parsing, serialization, deep copy). Deeper structures are rejected
/// rather than risking stack exhaustion.
pub const MAX_DEPTH: usize = 128;

/// Comparator for opaque `Ptr` payloads.
pub type OpaqueCmp = fn(usize, usize) -> Ordering;
/// Hasher for opaque `Ptr` payloads (also used for whole composite keys).
pub type OpaqueHasher = fn(usize) -> u64;
/// Duplicates an opaque `Ptr` payload for deep copies.
pub type OpaqueCopy = fn(usize) -> usize;
/// Releases an opaque `Ptr` payload.
pub type OpaqueDestroy = fn(usize);
/// Renders an opaque `Ptr` payload into the serialization sink.
pub type OpaqueSerialize = fn(usize, &mut String);

/// User-supplied callbacks customizing opaque payload behavior.
///
/// All slots are optional plain function pointers, mirroring the
/// construction-time registration style of the container handles. A dict
/// propagates its handler set into copies; the hash-table-specific hasher
/// and key comparator live on the backend instead (see
/// [`Dict::set_hasher`](crate::dict::Dict::set_hasher)).
#[derive(Clone, Copy, Debug, Default)]
pub struct Handlers {
    /// Orders two opaque payloads. Without it `Ptr` values compare by
    /// address, which is stable but meaningless.
    pub cmp: Option<OpaqueCmp>,
    /// Duplicates an opaque payload; required for deep copies of values
    /// containing non-nil `Ptr`s.
    pub copy: Option<OpaqueCopy>,
    /// Releases an opaque payload; invoked by owning containers.
    pub destroy: Option<OpaqueDestroy>,
    /// Custom text form for opaque payloads.
    pub serialize: Option<OpaqueSerialize>,
}

/// A dynamically typed value.
///
/// Only the accessor matching the discriminant is valid; the checked
/// accessors panic on mismatch.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absence of a value (`null` in the text form).
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer. Compares and hashes in the same numeric
    /// class as `Int` and `Real`.
    Size(u64),
    /// IEEE 754 double.
    Real(f64),
    /// Immutable UTF-8 string, shared by reference.
    Str(Rc<str>),
    /// Message-carrying error value. Part of the algebra so that data
    /// errors can travel through the normal value paths.
    Error(Rc<str>),
    /// Raw byte chunk, shared by reference.
    Chunk(Rc<[u8]>),
    /// Opaque address-sized token. Never dereferenced by the library;
    /// `0` is the nil pointer.
    Ptr(usize),
    /// Sequence of values.
    Vector(Rc<RefCell<Vec<Value>>>),
    /// Associative container, see [`Dict`].
    Dict(Rc<RefCell<Dict>>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn error(msg: impl Into<Rc<str>>) -> Value {
        Value::Error(msg.into())
    }

    pub fn chunk(data: impl Into<Rc<[u8]>>) -> Value {
        Value::Chunk(data.into())
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(Rc::new(RefCell::new(items)))
    }

    pub fn dict(d: Dict) -> Value {
        Value::Dict(Rc::new(RefCell::new(d)))
    }

    /// Human-readable discriminant name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Size(_) => "size",
            Value::Real(_) => "real",
            Value::Str(_) => "str",
            Value::Error(_) => "error",
            Value::Chunk(_) => "chunk",
            Value::Ptr(_) => "ptr",
            Value::Vector(_) => "vector",
            Value::Dict(_) => "dict",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    fn mismatch(&self, expected: &str) -> ! {
        panic!(
            "value type mismatch: expected {expected}, found {}",
            self.type_name()
        );
    }

    /// # Panics
    /// If the value is not `Bool`.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            other => other.mismatch("bool"),
        }
    }

    /// # Panics
    /// If the value is not `Int`.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(i) => *i,
            other => other.mismatch("int"),
        }
    }

    /// # Panics
    /// If the value is not `Size`.
    pub fn as_size(&self) -> u64 {
        match self {
            Value::Size(s) => *s,
            other => other.mismatch("size"),
        }
    }

    /// # Panics
    /// If the value is not `Real`.
    pub fn as_real(&self) -> f64 {
        match self {
            Value::Real(r) => *r,
            other => other.mismatch("real"),
        }
    }

    /// # Panics
    /// If the value is not `Str`.
    pub fn as_str(&self) -> &str {
        match self {
            Value::Str(s) => s,
            other => other.mismatch("str"),
        }
    }

    /// # Panics
    /// If the value is not `Error`.
    pub fn as_error(&self) -> &str {
        match self {
            Value::Error(e) => e,
            other => other.mismatch("error"),
        }
    }

    /// # Panics
    /// If the value is not `Chunk`.
    pub fn as_chunk(&self) -> Rc<[u8]> {
        match self {
            Value::Chunk(c) => Rc::clone(c),
            other => other.mismatch("chunk"),
        }
    }

    /// # Panics
    /// If the value is not `Ptr`.
    pub fn as_ptr(&self) -> usize {
        match self {
            Value::Ptr(p) => *p,
            other => other.mismatch("ptr"),
        }
    }

    /// # Panics
    /// If the value is not `Vector`.
    pub fn as_vector(&self) -> Rc<RefCell<Vec<Value>>> {
        match self {
            Value::Vector(v) => Rc::clone(v),
            other => other.mismatch("vector"),
        }
    }

    /// # Panics
    /// If the value is not `Dict`.
    pub fn as_dict(&self) -> Rc<RefCell<Dict>> {
        match self {
            Value::Dict(d) => Rc::clone(d),
            other => other.mismatch("dict"),
        }
    }

    /// Recursively reconstructs composite payloads. Scalars and immutable
    /// shared payloads (strings, chunks) keep their representation; vectors
    /// and dicts are rebuilt element by element. Non-nil `Ptr` payloads go
    /// through `handlers.copy`.
    ///
    /// # Panics
    /// If a non-nil `Ptr` is reached and `handlers.copy` is absent, or if
    /// nesting exceeds [`MAX_DEPTH`].
    pub fn deep_copy(&self, handlers: &Handlers) -> Value {
        self.deep_copy_at(handlers, 0)
    }

    pub(crate) fn deep_copy_at(&self, handlers: &Handlers, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            panic!("deep copy exceeds the maximum nesting depth of {MAX_DEPTH}");
        }
        match self {
            Value::Ptr(0) => Value::Ptr(0),
            Value::Ptr(p) => match handlers.copy {
                Some(copy) => Value::Ptr(copy(*p)),
                None => panic!("deep copy of a ptr value requires a copy handler"),
            },
            Value::Vector(v) => {
                let items = v
                    .borrow()
                    .iter()
                    .map(|e| e.deep_copy_at(handlers, depth + 1))
                    .collect();
                Value::vector(items)
            }
            // A dict copies its entries with its own handler set.
            Value::Dict(d) => Value::dict(d.borrow().deep_copy_at(depth)),
            other => other.clone(),
        }
    }

    /// Owner-side teardown hook: invokes the user destroyer on every
    /// non-nil `Ptr` payload reachable from this value. Recurses into a
    /// composite only when this container holds its last reference, so a
    /// payload still shared elsewhere stays alive. A nested dict that owns
    /// its own data is skipped here; its `Drop` applies its own policy.
    pub(crate) fn release(&self, handlers: &Handlers) {
        match self {
            Value::Ptr(p) => {
                if *p != 0 {
                    if let Some(destroy) = handlers.destroy {
                        destroy(*p);
                    }
                }
            }
            Value::Vector(v) => {
                if Rc::strong_count(v) == 1 {
                    for item in v.borrow().iter() {
                        item.release(handlers);
                    }
                }
            }
            Value::Dict(d) => {
                if Rc::strong_count(d) == 1 && !d.borrow().owns_data() {
                    d.borrow().release_entries(handlers);
                }
            }
            _ => {}
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Value {
        Value::Real(r)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(Rc::from(s.as_str()))
    }
}

// Equality is compare() with no opaque comparator. Ptr values fall back to
// address identity, so Eq never panics.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other, None) == Ordering::Equal
    }
}

impl Eq for Value {}

/// Cross-type ordering rank. All three numeric discriminants share one rank
/// and compare by mathematical value.
fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Size(_) | Value::Real(_) => 2,
        Value::Str(_) => 3,
        Value::Error(_) => 4,
        Value::Chunk(_) => 5,
        Value::Ptr(_) => 6,
        Value::Vector(_) => 7,
        Value::Dict(_) => 8,
    }
}

/// Orders two reals as numbers: the two IEEE zeros are the same number,
/// NaNs are admitted at the extremes (`total_cmp`) so the order stays total.
fn real_cmp(x: f64, y: f64) -> Ordering {
    let x = if x == 0.0 { 0.0 } else { x };
    let y = if y == 0.0 { 0.0 } else { y };
    x.total_cmp(&y)
}

/// Orders an integer against a real exactly. Casting the integer to f64
/// loses precision above 2^53 and would collapse distinct keys, so the
/// real's integer part is compared as an i128 instead, with the fraction
/// as a tiebreak. NaN sits at the extremes, consistent with `total_cmp`.
fn int_vs_real(i: i128, r: f64) -> Ordering {
    if r.is_nan() {
        return if r.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if r == f64::INFINITY {
        return Ordering::Less;
    }
    if r == f64::NEG_INFINITY {
        return Ordering::Greater;
    }
    // |i| < 2^64, so any real at or beyond 2^127 decides the order outright
    // and anything inside casts to i128 exactly after truncation
    if r >= 2f64.powi(127) {
        return Ordering::Less;
    }
    if r <= -(2f64.powi(127)) {
        return Ordering::Greater;
    }
    let t = r.trunc();
    match i.cmp(&(t as i128)) {
        Ordering::Equal => {
            if r > t {
                Ordering::Less
            } else if r < t {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        diff => diff,
    }
}

fn numeric_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Size(x), Value::Size(y)) => x.cmp(y),
        (Value::Real(x), Value::Real(y)) => real_cmp(*x, *y),
        (Value::Int(x), Value::Size(y)) => {
            if *x < 0 {
                Ordering::Less
            } else {
                (*x as u64).cmp(y)
            }
        }
        (Value::Size(x), Value::Int(y)) => {
            if *y < 0 {
                Ordering::Greater
            } else {
                x.cmp(&(*y as u64))
            }
        }
        (Value::Int(x), Value::Real(y)) => int_vs_real(*x as i128, *y),
        (Value::Real(x), Value::Int(y)) => int_vs_real(*y as i128, *x).reverse(),
        (Value::Size(x), Value::Real(y)) => int_vs_real(*x as i128, *y),
        (Value::Real(x), Value::Size(y)) => int_vs_real(*y as i128, *x).reverse(),
        _ => unreachable!("numeric_cmp called on non-numeric values"),
    }
}

/// Total order over all values.
///
/// Cross-type rank: Null < Bool < numeric < Str < Error < Chunk < Ptr <
/// Vector < Dict. Same-type: scalars by value, strings and chunks
/// byte-lexicographic, vectors element-wise then shorter-is-less, dicts by
/// key-sorted canonical snapshots (see [`crate::dict::compare`]). Shared
/// payloads short-circuit to `Equal` on identity.
///
/// `cmp` orders opaque `Ptr` payloads; without it they compare by address.
pub fn compare(a: &Value, b: &Value, cmp: Option<OpaqueCmp>) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => {
            if Rc::ptr_eq(x, y) {
                Ordering::Equal
            } else {
                x.as_bytes().cmp(y.as_bytes())
            }
        }
        (Value::Error(x), Value::Error(y)) => {
            if Rc::ptr_eq(x, y) {
                Ordering::Equal
            } else {
                x.as_bytes().cmp(y.as_bytes())
            }
        }
        (Value::Chunk(x), Value::Chunk(y)) => {
            if Rc::ptr_eq(x, y) {
                Ordering::Equal
            } else {
                x.as_ref().cmp(y.as_ref())
            }
        }
        (Value::Ptr(x), Value::Ptr(y)) => match cmp {
            Some(f) => f(*x, *y),
            None => x.cmp(y),
        },
        (Value::Vector(x), Value::Vector(y)) => {
            if Rc::ptr_eq(x, y) {
                return Ordering::Equal;
            }
            let xs = x.borrow();
            let ys = y.borrow();
            for (ex, ey) in xs.iter().zip(ys.iter()) {
                let diff = compare(ex, ey, cmp);
                if diff != Ordering::Equal {
                    return diff;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (Value::Dict(x), Value::Dict(y)) => {
            if Rc::ptr_eq(x, y) {
                Ordering::Equal
            } else {
                crate::dict::compare(&x.borrow(), &y.borrow(), cmp)
            }
        }
        _ => {
            let (ra, rb) = (type_rank(a), type_rank(b));
            if ra == 2 && rb == 2 {
                numeric_cmp(a, b)
            } else {
                ra.cmp(&rb)
            }
        }
    }
}

// Canonical form for hashing numerics: values that compare equal must hash
// equally, so integral reals collapse to integers.
enum Num {
    I(i128),
    F(u64),
}

fn canonical_num(v: &Value) -> Num {
    match v {
        Value::Int(i) => Num::I(*i as i128),
        Value::Size(s) => Num::I(*s as i128),
        Value::Real(r) => {
            let r = if *r == 0.0 { 0.0 } else { *r };
            if r.is_finite() && r.fract() == 0.0 && r.abs() < 2f64.powi(127) {
                Num::I(r as i128)
            } else {
                Num::F(r.to_bits())
            }
        }
        _ => unreachable!("canonical_num called on a non-numeric value"),
    }
}

/// Hashes a value.
///
/// The default path covers scalars, strings, errors and chunks by hashing
/// their raw bytes (numerics through a canonical form consistent with
/// [`compare`]). Composite and `Ptr` values have no meaningful default;
/// they require `hasher`, which receives the opaque payload (for `Ptr`)
/// or the shared payload address (for composites).
///
/// # Panics
/// If the value is composite or a `Ptr` and `hasher` is absent.
pub fn hash(v: &Value, hasher: Option<OpaqueHasher>) -> u64 {
    let mut h = DefaultHasher::new();
    match v {
        Value::Null => h.write_u8(0),
        Value::Bool(b) => {
            h.write_u8(1);
            h.write_u8(*b as u8);
        }
        Value::Int(_) | Value::Size(_) | Value::Real(_) => {
            h.write_u8(2);
            match canonical_num(v) {
                Num::I(i) => h.write_i128(i),
                Num::F(bits) => {
                    h.write_u8(0xff);
                    h.write_u64(bits);
                }
            }
        }
        Value::Str(s) => {
            h.write_u8(3);
            h.write(s.as_bytes());
        }
        Value::Error(e) => {
            h.write_u8(4);
            h.write(e.as_bytes());
        }
        Value::Chunk(c) => {
            h.write_u8(5);
            h.write(c);
        }
        Value::Ptr(p) => match hasher {
            Some(f) => return f(*p),
            None => panic!("hashing a ptr value requires an explicit hasher"),
        },
        Value::Vector(rc) => match hasher {
            Some(f) => return f(Rc::as_ptr(rc) as usize),
            None => panic!("hashing a vector value requires an explicit hasher"),
        },
        Value::Dict(rc) => match hasher {
            Some(f) => return f(Rc::as_ptr(rc) as usize),
            None => panic!("hashing a dict value requires an explicit hasher"),
        },
    }
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_type_rank() {
        let order = [
            Value::Null,
            Value::Bool(false),
            Value::Int(1),
            Value::str("a"),
            Value::error("e"),
            Value::chunk(vec![1u8]),
            Value::Ptr(1),
            Value::vector(vec![]),
            Value::dict(Dict::new()),
        ];
        for (i, a) in order.iter().enumerate() {
            for (j, b) in order.iter().enumerate() {
                assert_eq!(compare(a, b, None), i.cmp(&j), "{} vs {}", i, j);
            }
        }
    }

    #[test]
    fn test_numeric_class() {
        assert_eq!(compare(&Value::Int(5), &Value::Size(5), None), Ordering::Equal);
        assert_eq!(compare(&Value::Int(5), &Value::Real(5.0), None), Ordering::Equal);
        assert_eq!(compare(&Value::Size(5), &Value::Real(5.5), None), Ordering::Less);
        assert_eq!(compare(&Value::Int(-1), &Value::Size(0), None), Ordering::Less);
        assert_eq!(compare(&Value::Real(-0.5), &Value::Int(0), None), Ordering::Less);
        assert_eq!(compare(&Value::Real(0.0), &Value::Real(-0.0), None), Ordering::Equal);
    }

    #[test]
    fn test_numeric_class_is_exact_beyond_2_53() {
        // f64 can no longer represent every integer here; the order must
        // still be exact
        let big = 1i64 << 53;
        assert_eq!(
            compare(&Value::Int(big), &Value::Real(big as f64), None),
            Ordering::Equal
        );
        assert_eq!(
            compare(&Value::Int(big + 1), &Value::Real(big as f64), None),
            Ordering::Greater
        );
        assert_eq!(
            compare(&Value::Real(big as f64), &Value::Int(big + 1), None),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::Int(big), &Value::Int(big + 1), None),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::Size((1u64 << 63) + 1), &Value::Real(2f64.powi(63)), None),
            Ordering::Greater
        );
        assert_eq!(
            compare(&Value::Int(i64::MAX), &Value::Real(f64::INFINITY), None),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::Int(i64::MIN), &Value::Real(f64::NEG_INFINITY), None),
            Ordering::Greater
        );
        assert_eq!(
            compare(&Value::Int(0), &Value::Real(0.5), None),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::Int(0), &Value::Real(-0.5), None),
            Ordering::Greater
        );
    }

    #[test]
    fn test_hash_matches_compare_beyond_2_53() {
        let big = 1i64 << 53;
        assert_eq!(
            hash(&Value::Int(big), None),
            hash(&Value::Real(big as f64), None)
        );
        // distinct under compare, so the hashes may and do differ
        assert_ne!(hash(&Value::Int(big + 1), None), hash(&Value::Int(big), None));
        assert_eq!(
            compare(&Value::Int(big + 1), &Value::Real(big as f64), None),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_is_reflexive() {
        let vals = [
            Value::Null,
            Value::Bool(true),
            Value::Int(-3),
            Value::Size(3),
            Value::Real(f64::NAN),
            Value::str("x"),
            Value::vector(vec![Value::Int(1), Value::str("y")]),
        ];
        for v in &vals {
            assert_eq!(compare(v, v, None), Ordering::Equal);
        }
    }

    #[test]
    fn test_vector_lexicographic() {
        let a = Value::vector(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let c = Value::vector(vec![Value::Int(1), Value::Int(9)]);
        assert_eq!(compare(&a, &b, None), Ordering::Less);
        assert_eq!(compare(&b, &c, None), Ordering::Less);
        assert_eq!(compare(&c, &a, None), Ordering::Greater);
    }

    #[test]
    fn test_string_byte_order() {
        assert_eq!(
            compare(&Value::str("abc"), &Value::str("abd"), None),
            Ordering::Less
        );
        assert_eq!(
            compare(&Value::str("ab"), &Value::str("abc"), None),
            Ordering::Less
        );
    }

    #[test]
    fn test_hash_numeric_consistency() {
        assert_eq!(hash(&Value::Int(5), None), hash(&Value::Size(5), None));
        assert_eq!(hash(&Value::Int(5), None), hash(&Value::Real(5.0), None));
        assert_eq!(hash(&Value::Int(0), None), hash(&Value::Real(-0.0), None));
        assert_ne!(hash(&Value::Int(5), None), hash(&Value::Int(6), None));
    }

    #[test]
    #[should_panic(expected = "requires an explicit hasher")]
    fn test_hash_vector_without_hasher_panics() {
        hash(&Value::vector(vec![]), None);
    }

    #[test]
    #[should_panic(expected = "value type mismatch")]
    fn test_wrong_accessor_panics() {
        Value::Int(1).as_str();
    }

    #[test]
    fn test_shallow_clone_shares_payload() {
        let v = Value::vector(vec![Value::Int(1)]);
        let shallow = v.clone();
        if let (Value::Vector(a), Value::Vector(b)) = (&v, &shallow) {
            assert!(Rc::ptr_eq(a, b));
        } else {
            panic!("expected vectors");
        }
    }

    #[test]
    fn test_deep_copy_detaches_payload() {
        let v = Value::vector(vec![Value::vector(vec![Value::Int(1)])]);
        let deep = v.deep_copy(&Handlers::default());
        if let (Value::Vector(a), Value::Vector(b)) = (&v, &deep) {
            assert!(!Rc::ptr_eq(a, b));
        } else {
            panic!("expected vectors");
        }
        assert_eq!(v, deep);
    }

    #[test]
    fn test_deep_copy_ptr_uses_copier() {
        fn bump(p: usize) -> usize {
            p + 1
        }
        let handlers = Handlers {
            copy: Some(bump),
            ..Handlers::default()
        };
        let copied = Value::Ptr(41).deep_copy(&handlers);
        assert_eq!(copied.as_ptr(), 42);
        // nil needs no copier
        assert_eq!(Value::Ptr(0).deep_copy(&Handlers::default()).as_ptr(), 0);
    }

    #[test]
    #[should_panic(expected = "requires a copy handler")]
    fn test_deep_copy_ptr_without_copier_panics() {
        Value::Ptr(7).deep_copy(&Handlers::default());
    }
}
