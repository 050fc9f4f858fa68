//! Generates the Rust struct and binary/textual codec methods for a
//! schema [`Record`].
//!
//! A `Parent` becomes an ordinary Record-typed field, tagged on the wire
//! by the parent's own assigned id/name exactly like any other member —
//! composition standing in for the inheritance Rust structs don't have,
//! matching how the wire format itself already treats a parent (a tagged
//! sub-value encoded ahead of the record's own members, not a flattened
//! set of fields).
//!
//! Binary encode is a single method regardless of key mode: the runtime
//! dispatch already lives in [`wireforge_core::binary::BinaryEncoder`],
//! so generated code never needs three near-identical encode paths.
//! Binary decode does branch once, between an ordered read (key mode
//! `None`, members read back in declared order with no tags at all) and
//! a tagged loop (`Integer`/`String`) dispatching on the field key read
//! from the wire. Textual encode/decode have only one discipline: every
//! member (and parent) is always keyed by its display name, matching
//! `Member := String ':' Value` in the textual grammar.

use std::collections::HashMap;

use proc_macro2::{Ident, TokenStream};
use quote::quote;
use tracing::debug;
use wireforge_core::error::{ensure, Result};
use wireforge_core::hash::hash_str;
use wireforge_idl::ast::{Modifier, Record, RecordId, Schema};

use crate::naming;
use crate::resolved::{self, Resolved};
use crate::unions;

enum Payload {
    Plain(Resolved),
    Sequence(Resolved),
    Mapping { key: Resolved, value: Resolved },
    Union { field_name: String, variants: Vec<(String, Resolved)> },
}

struct Slot {
    id: u32,
    wire_name: String,
    field_ident: Ident,
    field_type: TokenStream,
    payload: Payload,
}

fn build_slots(schema: &Schema, record: &Record) -> Result<Vec<Slot>> {
    let mut slots = Vec::new();

    for parent in &record.parents {
        let resolved_id = parent.resolved.expect("resolver sets Parent::resolved before code generation runs");
        let parent_record = &schema.records[resolved_id as usize];
        let r = Resolved::Record(resolved_id);
        slots.push(Slot {
            id: parent.id,
            wire_name: parent_record.name.clone(),
            field_ident: naming::field_ident(&parent_record.name),
            field_type: resolved::rust_type(schema, &r),
            payload: Payload::Plain(r),
        });
    }

    for member in &record.members {
        let field_ident = naming::field_ident(&member.name);
        match member.modifier {
            Modifier::Scalar => {
                let r = resolved::resolve(&member.types[0])?;
                let field_type = resolved::rust_type(schema, &r);
                slots.push(Slot { id: member.id, wire_name: member.display_name.clone(), field_ident, field_type, payload: Payload::Plain(r) });
            }
            Modifier::Sequence => {
                let r = resolved::resolve(&member.types[0])?;
                let el_type = resolved::rust_type(schema, &r);
                slots.push(Slot {
                    id: member.id,
                    wire_name: member.display_name.clone(),
                    field_ident,
                    field_type: quote! { Vec<#el_type> },
                    payload: Payload::Sequence(r),
                });
            }
            Modifier::Mapping => {
                let key_name = member.key_type.clone().expect("parser sets key_type for Mapping members");
                let key = Resolved::Primitive(key_name);
                let value = resolved::resolve(&member.types[0])?;
                let key_type = resolved::rust_type(schema, &key);
                let value_type = resolved::rust_type(schema, &value);
                slots.push(Slot {
                    id: member.id,
                    wire_name: member.display_name.clone(),
                    field_ident,
                    field_type: quote! { std::collections::HashMap<#key_type, #value_type> },
                    payload: Payload::Mapping { key, value },
                });
            }
            Modifier::Union => {
                let mut variants = Vec::new();
                for t in &member.types {
                    let r = resolved::resolve(t)?;
                    let tag = t.tag.clone().expect("parser assigns every union variant a default or explicit tag");
                    variants.push((tag, r));
                }
                let container_ident = naming::union_container_ident(&record.name, &member.name);
                slots.push(Slot {
                    id: member.id,
                    wire_name: member.display_name.clone(),
                    field_ident,
                    field_type: quote! { #container_ident },
                    payload: Payload::Union { field_name: member.name.clone(), variants },
                });
            }
        }
    }

    Ok(slots)
}

/// Members, parents, and union variant tags all share one dispatch hash
/// namespace per record (they're all looked up the same way off a
/// record's field tags), so the generator checks for collisions across
/// all of them together, not per-kind.
fn check_no_hash_collisions(record: &Record, slots: &[Slot]) -> Result<()> {
    let mut seen: HashMap<u64, &str> = HashMap::new();
    for slot in slots {
        let h = hash_str(&slot.wire_name);
        if let Some(prev) = seen.insert(h, &slot.wire_name) {
            ensure!(
                prev == slot.wire_name,
                BadClassMember,
                "members {:?} and {:?} of class {:?} collide under the dispatch hash",
                prev,
                slot.wire_name,
                record.name
            );
        }
    }
    for slot in slots {
        if let Payload::Union { field_name, variants } = &slot.payload {
            unions::check_no_tag_collisions(&record.name, field_name, variants)?;
        }
    }
    Ok(())
}

/// Expression converting a primitive value into the `String` used as a
/// textual mapping key. The textual grammar has no dedicated `Mapping`
/// production (see §4.3) — a mapping is written with the same `Object`
/// syntax a record uses, keyed by each entry's key converted to a string.
fn map_key_to_string_expr(key: &Resolved, binding: &TokenStream) -> TokenStream {
    match key {
        Resolved::Primitive(name) if name == "string" => quote! { #binding.clone() },
        // `u8 as char` is total: every byte value is a valid Unicode scalar
        // in the Latin-1 range, matching how a `char` field's own textual
        // encoding quotes the raw byte rather than a numeric codepoint.
        Resolved::Primitive(name) if name == "char" => quote! { (*#binding as char).to_string() },
        Resolved::Primitive(_) => quote! { #binding.to_string() },
        _ => unreachable!("resolver guarantees map keys are primitives"),
    }
}

/// Expression parsing a textual mapping key string back into the key's
/// primitive type.
fn map_key_from_string_expr(key: &Resolved, binding: &TokenStream) -> TokenStream {
    match key {
        Resolved::Primitive(name) if name == "string" => quote! { #binding },
        Resolved::Primitive(name) if name == "bool" => quote! {
            match #binding.as_str() {
                s if s.eq_ignore_ascii_case("true") => true,
                s if s.eq_ignore_ascii_case("false") => false,
                other => return Err(wireforge_core::error::Error::new(
                    wireforge_core::error::ErrorKind::BadInput,
                    format!("{:?} is not a valid bool mapping key", other),
                )),
            }
        },
        Resolved::Primitive(name) if name == "char" => quote! {
            *#binding.as_bytes().first().ok_or_else(|| wireforge_core::error::Error::new(
                wireforge_core::error::ErrorKind::BadInput,
                "char mapping key must not be empty",
            ))?
        },
        Resolved::Primitive(_) => quote! {
            #binding.parse().map_err(|e| wireforge_core::error::Error::new(
                wireforge_core::error::ErrorKind::BadInput,
                format!("invalid mapping key {:?}: {}", #binding, e),
            ))?
        },
        _ => unreachable!("resolver guarantees map keys are primitives"),
    }
}

fn binary_encode_slot(slot: &Slot) -> TokenStream {
    let field = &slot.field_ident;
    let id = slot.id;
    let wire_name = &slot.wire_name;
    match &slot.payload {
        Payload::Plain(r) => {
            let value = resolved::value_ref_expr(r, &quote! { (&self.#field) });
            let stmt = resolved::binary_encode_stmt(r, &quote! { enc }, &value);
            quote! {
                enc.record_field(#id, #wire_name)?;
                #stmt
            }
        }
        Payload::Sequence(r) => {
            let value = resolved::value_ref_expr(r, &quote! { item });
            let stmt = resolved::binary_encode_stmt(r, &quote! { enc }, &value);
            quote! {
                enc.record_field(#id, #wire_name)?;
                enc.encode_seq_len(self.#field.len())?;
                for item in &self.#field {
                    #stmt
                }
            }
        }
        Payload::Mapping { key, value } => {
            let key_value = resolved::value_ref_expr(key, &quote! { k });
            let key_stmt = resolved::binary_encode_stmt(key, &quote! { enc }, &key_value);
            let value_value = resolved::value_ref_expr(value, &quote! { v });
            let value_stmt = resolved::binary_encode_stmt(value, &quote! { enc }, &value_value);
            quote! {
                enc.record_field(#id, #wire_name)?;
                enc.encode_mapping_len(self.#field.len())?;
                for (k, v) in &self.#field {
                    #key_stmt
                    #value_stmt
                }
            }
        }
        Payload::Union { .. } => {
            quote! {
                if enc.mode() == wireforge_core::binary::KeyMode::String {
                    enc.record_union_field(#id, #wire_name, self.#field.discriminator().to_string())?;
                } else {
                    enc.record_field(#id, #wire_name)?;
                    enc.encode_enum_ordinal(self.#field.discriminator().ordinal())?;
                }
                self.#field.encode_binary(enc)?;
            }
        }
    }
}

fn binary_decode_ordered_slot(schema: &Schema, slot: &Slot) -> TokenStream {
    let field = &slot.field_ident;
    match &slot.payload {
        Payload::Plain(r) => {
            let expr = resolved::binary_decode_expr(schema, r, &quote! { dec });
            quote! { let #field = #expr; }
        }
        Payload::Sequence(r) => {
            let expr = resolved::binary_decode_expr(schema, r, &quote! { dec });
            quote! {
                let len = dec.decode_seq_len()?;
                let mut #field = Vec::with_capacity(len.min(4096));
                for _ in 0..len { #field.push(#expr); }
            }
        }
        Payload::Mapping { key, value } => {
            let key_expr = resolved::binary_decode_expr(schema, key, &quote! { dec });
            let value_expr = resolved::binary_decode_expr(schema, value, &quote! { dec });
            quote! {
                let len = dec.decode_mapping_len()?;
                let mut #field = std::collections::HashMap::with_capacity(len.min(4096));
                for _ in 0..len {
                    let key = #key_expr;
                    let value = #value_expr;
                    #field.insert(key, value);
                }
            }
        }
        Payload::Union { .. } => {
            let container_ident = &slot.field_type;
            quote! {
                let ordinal = dec.decode_enum_ordinal()?;
                let #field = #container_ident::decode_ordinal(ordinal, dec)?;
            }
        }
    }
}

/// One `match id { ... }` arm (by member id) and, for non-union slots, one
/// `match name { ... }` arm (by display name); union slots instead
/// contribute a prefix check run before the by-name match, since their
/// wire key is the composite `"<name>:<tag>"` string.
struct TaggedArms {
    by_id: TokenStream,
    by_name: TokenStream,
    union_prefix_check: Option<TokenStream>,
}

fn binary_tagged_arms(schema: &Schema, slot: &Slot) -> TaggedArms {
    let field = &slot.field_ident;
    let id = slot.id;
    let wire_name = &slot.wire_name;
    match &slot.payload {
        Payload::Plain(r) => {
            let expr = resolved::binary_decode_expr(schema, r, &quote! { dec });
            TaggedArms {
                by_id: quote! { #id => { #field = Some(#expr); } },
                by_name: quote! { #wire_name => { #field = Some(#expr); } },
                union_prefix_check: None,
            }
        }
        Payload::Sequence(r) => {
            let expr = resolved::binary_decode_expr(schema, r, &quote! { dec });
            let body = quote! {
                let len = dec.decode_seq_len()?;
                let mut items = Vec::with_capacity(len.min(4096));
                for _ in 0..len { items.push(#expr); }
                #field = Some(items);
            };
            TaggedArms {
                by_id: quote! { #id => { #body } },
                by_name: quote! { #wire_name => { #body } },
                union_prefix_check: None,
            }
        }
        Payload::Mapping { key, value } => {
            let key_expr = resolved::binary_decode_expr(schema, key, &quote! { dec });
            let value_expr = resolved::binary_decode_expr(schema, value, &quote! { dec });
            let body = quote! {
                let len = dec.decode_mapping_len()?;
                let mut items = std::collections::HashMap::with_capacity(len.min(4096));
                for _ in 0..len {
                    let key = #key_expr;
                    let value = #value_expr;
                    items.insert(key, value);
                }
                #field = Some(items);
            };
            TaggedArms {
                by_id: quote! { #id => { #body } },
                by_name: quote! { #wire_name => { #body } },
                union_prefix_check: None,
            }
        }
        Payload::Union { .. } => {
            let container_ident = &slot.field_type;
            let by_id = quote! {
                #id => {
                    let ordinal = dec.decode_enum_ordinal()?;
                    #field = Some(#container_ident::decode_ordinal(ordinal, dec)?);
                }
            };
            let prefix_check = quote! {
                if prefix == #wire_name {
                    #field = Some(#container_ident::decode_tagged(tag, dec)?);
                    continue;
                }
            };
            TaggedArms { by_id, by_name: quote! {}, union_prefix_check: Some(prefix_check) }
        }
    }
}

fn text_encode_slot(first: bool, slot: &Slot) -> TokenStream {
    let field = &slot.field_ident;
    let wire_name = &slot.wire_name;
    match &slot.payload {
        Payload::Plain(r) => {
            let value = resolved::value_ref_expr(r, &quote! { (&self.#field) });
            let stmt = resolved::text_encode_stmt(&quote! { enc }, r, &value);
            quote! {
                enc.object_key(#first, #wire_name)?;
                #stmt
            }
        }
        Payload::Sequence(r) => {
            let value = resolved::value_ref_expr(r, &quote! { item });
            let stmt = resolved::text_encode_stmt(&quote! { enc }, r, &value);
            quote! {
                enc.object_key(#first, #wire_name)?;
                enc.begin_array()?;
                for (i, item) in self.#field.iter().enumerate() {
                    enc.array_element(i == 0)?;
                    #stmt
                }
                enc.end_array()?;
            }
        }
        Payload::Mapping { key, value } => {
            let key_str = map_key_to_string_expr(key, &quote! { k });
            let value_value = resolved::value_ref_expr(value, &quote! { v });
            let value_stmt = resolved::text_encode_stmt(&quote! { enc }, value, &value_value);
            quote! {
                enc.object_key(#first, #wire_name)?;
                enc.begin_object()?;
                for (i, (k, v)) in self.#field.iter().enumerate() {
                    enc.object_key(i == 0, &(#key_str))?;
                    #value_stmt
                }
                enc.end_object()?;
            }
        }
        Payload::Union { .. } => {
            quote! {
                enc.object_key(#first, #wire_name)?;
                enc.begin_object()?;
                enc.object_key(true, self.#field.discriminator().to_string())?;
                self.#field.encode_text(enc)?;
                enc.end_object()?;
            }
        }
    }
}

fn text_decode_arm(schema: &Schema, slot: &Slot) -> TokenStream {
    let field = &slot.field_ident;
    let wire_name = &slot.wire_name;
    match &slot.payload {
        Payload::Plain(r) => {
            let expr = resolved::text_decode_expr(schema, r, &quote! { dec });
            quote! { #wire_name => { #field = Some(#expr); } }
        }
        Payload::Sequence(r) => {
            let expr = resolved::text_decode_expr(schema, r, &quote! { dec });
            quote! {
                #wire_name => {
                    dec.begin_array()?;
                    let mut items = Vec::new();
                    let mut first = true;
                    while dec.array_has_next(first)? {
                        first = false;
                        items.push(#expr);
                    }
                    #field = Some(items);
                }
            }
        }
        Payload::Mapping { key, value } => {
            let value_expr = resolved::text_decode_expr(schema, value, &quote! { dec });
            let key_expr = map_key_from_string_expr(key, &quote! { key_str });
            quote! {
                #wire_name => {
                    dec.begin_object()?;
                    let mut items = std::collections::HashMap::new();
                    let mut first = true;
                    while let Some(key_str) = dec.object_next_key(first)? {
                        first = false;
                        let key = #key_expr;
                        let value = #value_expr;
                        items.insert(key, value);
                    }
                    #field = Some(items);
                }
            }
        }
        Payload::Union { .. } => {
            let container_ident = &slot.field_type;
            quote! {
                #wire_name => {
                    dec.begin_object()?;
                    let tag = dec.object_next_key(true)?.ok_or_else(|| wireforge_core::error::Error::new(
                        wireforge_core::error::ErrorKind::BadInput,
                        format!("union field {:?} must have exactly one key naming its variant", #wire_name),
                    ))?;
                    let value = #container_ident::decode_tagged_text(&tag, dec)?;
                    if dec.object_next_key(false)?.is_some() {
                        return Err(wireforge_core::error::Error::new(
                            wireforge_core::error::ErrorKind::BadInput,
                            format!("union field {:?} must have exactly one key naming its variant", #wire_name),
                        ));
                    }
                    #field = Some(value);
                }
            }
        }
    }
}

pub fn generate_record(schema: &Schema, record_id: RecordId) -> Result<TokenStream> {
    let record = &schema.records[record_id as usize];
    debug!(class = %record.name, members = record.members.len(), "emitting record");
    let slots = build_slots(schema, record)?;
    check_no_hash_collisions(record, &slots)?;

    let struct_ident = naming::type_ident(&record.name);
    let record_name_lit = record.name.clone();

    let field_decls = slots.iter().map(|s| {
        let name = &s.field_ident;
        let ty = &s.field_type;
        quote! { pub #name: #ty }
    });

    let mut union_types = Vec::new();
    for slot in &slots {
        if let Payload::Union { field_name, variants } = &slot.payload {
            union_types.push(unions::generate_union_types(schema, &record.name, field_name, variants)?);
        }
    }

    // -- binary --

    let binary_encode_stmts = slots.iter().map(binary_encode_slot);

    let decode_ordered_stmts = slots.iter().map(|s| binary_decode_ordered_slot(schema, s));
    let ordered_struct_fields = slots.iter().map(|s| &s.field_ident);

    let tagged_arms: Vec<TaggedArms> = slots.iter().map(|s| binary_tagged_arms(schema, s)).collect();
    let decode_locals: Vec<TokenStream> = slots
        .iter()
        .map(|s| {
            let field = &s.field_ident;
            let ty = &s.field_type;
            quote! { let mut #field: Option<#ty> = None; }
        })
        .collect();
    let by_id_arms = tagged_arms.iter().map(|a| &a.by_id);
    let by_name_arms = tagged_arms.iter().filter(|a| !a.by_name.is_empty()).map(|a| &a.by_name);
    let union_prefix_checks = tagged_arms.iter().filter_map(|a| a.union_prefix_check.as_ref());

    let field_idents: Vec<_> = slots.iter().map(|s| s.field_ident.clone()).collect();
    let missing_field_messages: Vec<_> = slots.iter().map(|s| s.wire_name.clone()).collect();

    let binary_encode_fn = quote! {
        pub fn encode_binary<W: wireforge_core::cursor::OutputCursor>(
            &self,
            enc: &mut wireforge_core::binary::BinaryEncoder<W>,
        ) -> wireforge_core::Result<()> {
            enc.record_begin()?;
            #(#binary_encode_stmts)*
            enc.record_end()?;
            Ok(())
        }
    };

    let binary_decode_fn = quote! {
        pub fn decode_binary(dec: &mut wireforge_core::binary::BinaryDecoder) -> wireforge_core::Result<Self> {
            dec.record_begin()?;
            if dec.mode() == wireforge_core::binary::KeyMode::None {
                #(#decode_ordered_stmts)*
                Ok(Self { #(#ordered_struct_fields),* })
            } else {
                #(#decode_locals)*
                loop {
                    match dec.next_field()? {
                        None => break,
                        Some(wireforge_core::binary::FieldKey::Id(id)) => {
                            match id {
                                #(#by_id_arms,)*
                                other => return Err(wireforge_core::error::Error::new(
                                    wireforge_core::error::ErrorKind::KeyNotFound,
                                    format!("class {:?} has no member with id {}", #record_name_lit, other),
                                )),
                            }
                        }
                        Some(wireforge_core::binary::FieldKey::Name(name)) => {
                            if let Some((prefix, tag)) = wireforge_core::binary::split_union_key(&name) {
                                #(#union_prefix_checks)*
                            }
                            match name.as_str() {
                                #(#by_name_arms,)*
                                other => return Err(wireforge_core::error::Error::new(
                                    wireforge_core::error::ErrorKind::KeyNotFound,
                                    format!("class {:?} has no member named {:?}", #record_name_lit, other),
                                )),
                            }
                        }
                    }
                }
                Ok(Self {
                    #(#field_idents: #field_idents.ok_or_else(|| wireforge_core::error::Error::new(
                        wireforge_core::error::ErrorKind::KeyNotFound,
                        format!("class {:?} is missing required field {:?}", #record_name_lit, #missing_field_messages),
                    ))?,)*
                })
            }
        }
    };

    // -- text --

    let text_encode_stmts = slots.iter().enumerate().map(|(i, s)| text_encode_slot(i == 0, s));
    let text_decode_arms = slots.iter().map(|s| text_decode_arm(schema, s));
    let text_decode_locals = decode_locals.clone();
    let text_field_idents = field_idents.clone();
    let text_missing_field_messages = missing_field_messages.clone();

    let text_encode_fn = quote! {
        pub fn encode_text<W: wireforge_core::cursor::OutputCursor>(
            &self,
            enc: &mut wireforge_core::text::TextEncoder<W>,
        ) -> wireforge_core::Result<()> {
            enc.begin_object()?;
            #(#text_encode_stmts)*
            enc.end_object()
        }
    };

    let text_decode_fn = quote! {
        pub fn decode_text(dec: &mut wireforge_core::text::TextDecoder) -> wireforge_core::Result<Self> {
            dec.begin_object()?;
            #(#text_decode_locals)*
            let mut first = true;
            while let Some(key) = dec.object_next_key(first)? {
                first = false;
                match key.as_str() {
                    #(#text_decode_arms,)*
                    other => return Err(wireforge_core::error::Error::new(
                        wireforge_core::error::ErrorKind::KeyNotFound,
                        format!("class {:?} has no member named {:?}", #record_name_lit, other),
                    )),
                }
            }
            Ok(Self {
                #(#text_field_idents: #text_field_idents.ok_or_else(|| wireforge_core::error::Error::new(
                    wireforge_core::error::ErrorKind::KeyNotFound,
                    format!("class {:?} is missing required field {:?}", #record_name_lit, #text_missing_field_messages),
                ))?,)*
            })
        }
    };

    Ok(quote! {
        #(#union_types)*

        #[derive(Debug, Clone, PartialEq)]
        pub struct #struct_ident {
            #(#field_decls),*
        }

        impl #struct_ident {
            #binary_encode_fn
            #binary_decode_fn
            #text_encode_fn
            #text_decode_fn
        }
    })
}
