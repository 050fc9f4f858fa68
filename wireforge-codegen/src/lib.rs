//! Code generator for the wireforge serialization toolkit.
//!
//! Takes a resolved [`wireforge_idl::Schema`] (already run through
//! [`wireforge_idl::parse_and_resolve`]) and emits Rust source — a
//! [`proc_macro2::TokenStream`], not a file on disk — defining, for every
//! schema record, a struct with an embedded `encode_binary`/`decode_binary`
//! pair (dispatched at runtime on [`wireforge_core::binary::KeyMode`]) and
//! an `encode_text`/`decode_text` pair over [`wireforge_core::text`]; for
//! every schema enumeration, a C-like enum with `ordinal`/`from_ordinal`
//! and hash-dispatched `to_string`/`from_string`; and for every
//! union-modifier member, a companion discriminator enum and variant
//! container with the same round-trip helpers.
//!
//! Writing the generated source to a file (and any `rustfmt` pass over
//! it) is the external CLI driver's job — out of scope here, same as the
//! rest of this toolkit.

pub mod enums;
mod generator;
pub mod naming;
pub mod records;
pub mod resolved;
pub mod unions;

pub use generator::generate;
pub use wireforge_core::error::{Error, ErrorKind, Result};
