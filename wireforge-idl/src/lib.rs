//! Schema IDL front end: lexer, recursive-descent parser, and a two-pass
//! resolver that turns a parsed tree of unresolved names into one where
//! every member type and parent class points at a concrete primitive,
//! record, or enum.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod primitive;
pub mod resolve;

pub use ast::Schema;
pub use wireforge_core::error::{Error, ErrorKind, Result};

/// Parse and fully resolve a schema source file in one call. This is the
/// entry point [`wireforge_codegen`](../wireforge_codegen/index.html) drives
/// off of.
pub fn parse_and_resolve(source: &str) -> Result<Schema> {
    let mut schema = parser::parse(source)?;
    resolve::resolve(&mut schema)?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_resolve_end_to_end() {
        let schema = parse_and_resolve(
            "namespace app { class person { public string name; public uint64 id; } }",
        )
        .unwrap();
        assert_eq!(schema.records.len(), 1);
        assert_eq!(schema.records[0].members[0].types[0].kind, ast::TypeKind::Primitive);
    }
}
