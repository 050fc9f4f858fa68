//! Runtime codec core for the wireforge serialization toolkit.
//!
//! This crate carries no knowledge of schemas: it is the set of primitives
//! — byte cursors, endian conversion, the textual wire format, and the
//! binary wire format with its three key-mode record framings — that
//! generated record code (from `wireforge-codegen`) calls into. `wireforge-idl`
//! and `wireforge-codegen` depend on this crate only for its shared
//! `Error`/`ErrorKind` type and the deterministic string hash used for key
//! dispatch; they do not reach into the wire formats directly.

pub mod binary;
pub mod cursor;
pub mod endian;
pub mod error;
pub mod format;
pub mod hash;
pub mod text;
pub mod vlq;

pub use cursor::Cursor;
pub use error::{Error, ErrorKind, Result};
pub use format::Format;
