//! Flattens a resolved [`wireforge_idl::ast::TypeReference`] down to the
//! three shapes the generator actually needs to branch on, and builds the
//! encode/decode expressions shared by scalar members, sequence/mapping
//! elements, and union variant payloads alike.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use wireforge_core::error::{bail, Result};
use wireforge_idl::ast::{EnumId, NamespaceId, RecordId, Schema, TypeKind, TypeReference};

use crate::naming;

#[derive(Debug, Clone)]
pub enum Resolved {
    Primitive(String),
    Record(RecordId),
    Enum(EnumId),
}

pub fn resolve(t: &TypeReference) -> Result<Resolved> {
    match t.kind {
        TypeKind::Primitive => Ok(Resolved::Primitive(t.name.clone())),
        TypeKind::Record => Ok(Resolved::Record(t.resolved_id.expect("resolver sets resolved_id for Record kind"))),
        TypeKind::Enumeration => {
            Ok(Resolved::Enum(t.resolved_id.expect("resolver sets resolved_id for Enumeration kind")))
        }
        TypeKind::Unresolved => bail!(
            BadMemberType,
            "type reference {:?} reached code generation unresolved; run resolve() first",
            t.name
        ),
    }
}

/// Binary/textual codec method suffix for a schema primitive name. `char`
/// and `uint8` both map to the Rust type `u8` but use distinct codec
/// methods (`*_char` vs `*_u8`), so this keys off the schema name, not the
/// Rust type.
fn scalar_suffix(schema_name: &str) -> &'static str {
    match schema_name {
        "char" => "char",
        "bool" => "bool",
        "int8" => "i8",
        "int16" => "i16",
        "int32" => "i32",
        "int64" => "i64",
        "uint8" => "u8",
        "uint16" => "u16",
        "uint32" => "u32",
        "uint64" => "u64",
        "float" => "f32",
        "double" => "f64",
        "string" => "string",
        other => unreachable!("not a primitive schema name: {other}"),
    }
}

pub fn module_path(schema: &Schema, namespace: NamespaceId, type_name: &str) -> TokenStream {
    let ns_full = schema.namespace_full_name(namespace);
    let mut path = String::from("crate");
    if !ns_full.is_empty() {
        for seg in ns_full.split("::") {
            path.push_str("::");
            path.push_str(seg);
        }
    }
    path.push_str("::");
    path.push_str(&naming::pascal_case(type_name));
    path.parse().expect("module path is always a valid Rust path")
}

pub fn rust_type(schema: &Schema, r: &Resolved) -> TokenStream {
    match r {
        Resolved::Primitive(name) => {
            let rust_name = wireforge_idl::primitive::rust_type_for(name).expect("checked by resolver");
            rust_name.parse().expect("primitive table entries are valid Rust type names")
        }
        Resolved::Record(id) => {
            let record = &schema.records[*id as usize];
            module_path(schema, record.namespace, &record.name)
        }
        Resolved::Enum(id) => {
            let en = &schema.enums[*id as usize];
            module_path(schema, en.namespace, &en.name)
        }
    }
}

/// Shapes a reference-bound place (a struct field accessed through
/// `&self`, or a loop variable bound by `for v in &collection`) into the
/// exact expression [`binary_encode_stmt`]/[`text_encode_stmt`] expect:
/// `.as_str()` for strings, a deref for by-value Copy scalars, and the
/// reference itself for records/enums (whose `encode_binary`/`ordinal`
/// already take `&self`).
pub fn value_ref_expr(r: &Resolved, binding: &TokenStream) -> TokenStream {
    match r {
        Resolved::Primitive(name) if name == "string" => quote! { #binding.as_str() },
        Resolved::Primitive(_) => quote! { *#binding },
        Resolved::Record(_) | Resolved::Enum(_) => quote! { #binding },
    }
}

/// `enc.encode_xyz(<value>)?;` for a binary encoder. The caller is
/// responsible for shaping `value` to exactly the type each arm expects:
/// the scalar's own type by value for non-string primitives, `&str` for
/// strings, and `&RecordType`/`&EnumType` for nested records/enums (their
/// `encode_binary`/`ordinal` take `&self`).
pub fn binary_encode_stmt(r: &Resolved, enc: &TokenStream, value: &TokenStream) -> TokenStream {
    match r {
        Resolved::Primitive(name) if name == "string" => {
            quote! { #enc.encode_string(#value)?; }
        }
        Resolved::Primitive(name) => {
            let m = format_ident!("encode_{}", scalar_suffix(name));
            quote! { #enc.#m(#value)?; }
        }
        Resolved::Record(_) => quote! { #value.encode_binary(#enc)?; },
        Resolved::Enum(_) => quote! { #enc.encode_enum_ordinal(#value.ordinal())?; },
    }
}

/// An expression that decodes one value of this resolved type from a
/// binary decoder.
pub fn binary_decode_expr(schema: &Schema, r: &Resolved, dec: &TokenStream) -> TokenStream {
    match r {
        Resolved::Primitive(name) if name == "string" => {
            let m = format_ident!("decode_string");
            quote! { #dec.#m()? }
        }
        Resolved::Primitive(name) => {
            let m = format_ident!("decode_{}", scalar_suffix(name));
            quote! { #dec.#m()? }
        }
        Resolved::Record(id) => {
            let path = module_path(schema, schema.records[*id as usize].namespace, &schema.records[*id as usize].name);
            quote! { #path::decode_binary(#dec)? }
        }
        Resolved::Enum(id) => {
            let path = module_path(schema, schema.enums[*id as usize].namespace, &schema.enums[*id as usize].name);
            quote! { #path::from_ordinal(#dec.decode_enum_ordinal()?)? }
        }
    }
}

/// Same shaping contract as [`binary_encode_stmt`].
pub fn text_encode_stmt(enc: &TokenStream, r: &Resolved, value: &TokenStream) -> TokenStream {
    match r {
        Resolved::Primitive(name) if name == "string" => quote! { #enc.encode_string(#value)?; },
        Resolved::Primitive(name) => {
            let m = format_ident!("encode_{}", scalar_suffix(name));
            quote! { #enc.#m(#value)?; }
        }
        Resolved::Record(_) => quote! { #value.encode_text(#enc)?; },
        Resolved::Enum(_) => quote! { #enc.encode_string(#value.to_string())?; },
    }
}

pub fn text_decode_expr(schema: &Schema, r: &Resolved, dec: &TokenStream) -> TokenStream {
    match r {
        Resolved::Primitive(name) if name == "string" => quote! { #dec.decode_string()? },
        Resolved::Primitive(name) => {
            let m = format_ident!("decode_{}", scalar_suffix(name));
            quote! { #dec.#m()? }
        }
        Resolved::Record(id) => {
            let path = module_path(schema, schema.records[*id as usize].namespace, &schema.records[*id as usize].name);
            quote! { #path::decode_text(#dec)? }
        }
        Resolved::Enum(id) => {
            let path = module_path(schema, schema.enums[*id as usize].namespace, &schema.enums[*id as usize].name);
            quote! { #path::from_string(&#dec.decode_string()?)? }
        }
    }
}
