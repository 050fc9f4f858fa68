//! Schema identifier -> Rust identifier conventions.
//!
//! Field names and namespace segments are kept verbatim (schema authors
//! already write them in the casing they want on the wire and in
//! generated code); type-level items (record structs, enum types, enum
//! variants, union discriminator/container variants) are converted to
//! `PascalCase` since the schema convention for class/enum names is
//! lowercase and Rust's own convention for type names is not.

use proc_macro2::Ident;
use quote::format_ident;

pub fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut capitalize_next = true;
    for c in name.chars() {
        if c == '_' {
            capitalize_next = true;
            continue;
        }
        if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn type_ident(name: &str) -> Ident {
    format_ident!("{}", pascal_case(name))
}

pub fn field_ident(name: &str) -> Ident {
    format_ident!("{}", name)
}

/// Identifier for a generated `pub mod` wrapping one schema namespace's
/// records and enumerations. Namespace segments are already valid Rust
/// module names (the grammar's `Ident` production matches Rust's own),
/// so no case conversion is needed here.
pub fn module_ident(namespace_name: &str) -> Ident {
    format_ident!("{}", namespace_name)
}

/// Identifier for the per-record, per-union-field discriminator
/// enumeration: `<Record>_e_<field>`. The `<Record>_` prefix avoids
/// collisions between unrelated records' union fields, since generated
/// items for every record in a namespace sit flat alongside each other as
/// Rust module items rather than nested inside a class scope.
pub fn union_discriminator_ident(record_name: &str, field_name: &str) -> Ident {
    format_ident!("{}_e_{}", pascal_case(record_name), field_name)
}

/// Identifier for the per-record, per-union-field variant container:
/// `<Record>_u_<field>`. See [`union_discriminator_ident`].
pub fn union_container_ident(record_name: &str, field_name: &str) -> Ident {
    format_ident!("{}_u_{}", pascal_case(record_name), field_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_splits_on_underscore() {
        assert_eq!(pascal_case("person"), "Person");
        assert_eq!(pascal_case("http_server"), "HttpServer");
        assert_eq!(pascal_case("e_0"), "E0");
    }
}
