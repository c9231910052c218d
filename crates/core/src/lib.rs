//! Motley Core: dynamic tagged values with pluggable dict backends
//!
//! This crate provides a small dynamic value system for code that needs to
//! pass heterogeneous data through one type: a closed `Value` enum with a
//! total order and consistent hashing, an associative `Dict` that runs on
//! an interchangeable backend (plain BST, red-black BST, or hash table),
//! and a JSON-compatible text codec with exact byte-offset error reporting.
//!
//! Key design principles:
//! - Value: one closed sum type, shallow `Clone`, explicit `deep_copy`
//! - Dict: one interface, three backends, identical observable semantics
//! - Opaque payloads: `Ptr` tokens the library never interprets itself,
//!   customized through a per-container handler set
//!
//! # Modules
//!
//! - `value`: the `Value` enum, `compare`/`hash`, deep copy, `Handlers`
//! - `dict`: the dict interface, backend selection, iteration, comparison
//! - `parse`: recursive-descent parser for the text codec
//! - `serialize`: canonical text emission
//! - `error`: data-error types (parse failures)

pub mod dict;
pub mod error;
pub mod parse;
pub mod serialize;
pub mod value;

mod bst;
mod htbl;

// Re-export key types and functions
pub use dict::{Backend, Dict, DictIter, compare as dict_compare, default_backend, set_default_backend};
pub use error::ParseError;
pub use parse::parse;
pub use serialize::{value_to_text, write_value};
pub use value::{Handlers, MAX_DEPTH, Value, compare, hash};
