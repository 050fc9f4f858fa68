//! Generates the companion types for a `union`-modifier member: a
//! discriminator enumeration (`e_<field>`) with one symbol per variant,
//! and a variant container (`u_<field>`) that actually carries the
//! payload. Both get the same hash-dispatched `to_string`/`from_string`
//! pair the code generator gives every enumeration.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use wireforge_core::error::{ensure, Result};
use wireforge_core::hash::hash_str;
use wireforge_idl::ast::Schema;

use crate::naming;
use crate::resolved::{self, Resolved};

pub fn check_no_tag_collisions(record_name: &str, field_name: &str, variants: &[(String, Resolved)]) -> Result<()> {
    let mut seen: HashMap<u64, &str> = HashMap::new();
    for (tag, _) in variants {
        let h = hash_str(tag);
        if let Some(prev) = seen.insert(h, tag.as_str()) {
            ensure!(
                prev == tag,
                BadClassMember,
                "union variant tags {:?} and {:?} on member {:?} of class {:?} collide under the dispatch hash",
                prev,
                tag,
                field_name,
                record_name
            );
        }
    }
    Ok(())
}

/// `value`, here, is already shaped as `&T` for whichever `T` the variant
/// carries (bound by a `match` arm on `&self`), matching the convention
/// [`resolved::value_ref_expr`] expects everywhere else in the generator.
pub fn generate_union_types(
    schema: &Schema,
    record_name: &str,
    field_name: &str,
    variants: &[(String, Resolved)],
) -> Result<TokenStream> {
    check_no_tag_collisions(record_name, field_name, variants)?;

    let disc_ident = naming::union_discriminator_ident(record_name, field_name);
    let container_ident = naming::union_container_ident(record_name, field_name);

    let variant_idents: Vec<_> = variants.iter().map(|(tag, _)| naming::type_ident(tag)).collect();
    let payload_types: Vec<_> = variants.iter().map(|(_, r)| resolved::rust_type(schema, r)).collect();

    let ordinal_arms = variant_idents.iter().enumerate().map(|(i, v)| {
        let i = i as u32;
        quote! { #disc_ident::#v => #i }
    });
    let from_ordinal_arms = variant_idents.iter().enumerate().map(|(i, v)| {
        let i = i as u32;
        quote! { #i => Ok(#disc_ident::#v) }
    });
    let to_string_arms = variants.iter().zip(&variant_idents).map(|((tag, _), v)| {
        quote! { #disc_ident::#v => #tag }
    });
    let from_string_arms = variants.iter().zip(&variant_idents).map(|((tag, _), v)| {
        let h = hash_str(tag);
        quote! { #h => Ok(#disc_ident::#v) }
    });

    let disc_name_lit = format!("{}::{}", record_name, field_name);

    let discriminator_decl = quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum #disc_ident {
            #(#variant_idents),*
        }

        impl #disc_ident {
            pub fn ordinal(&self) -> u32 {
                match self {
                    #(#ordinal_arms),*
                }
            }

            pub fn from_ordinal(ordinal: u32) -> wireforge_core::Result<Self> {
                match ordinal {
                    #(#from_ordinal_arms,)*
                    other => Err(wireforge_core::error::Error::new(
                        wireforge_core::error::ErrorKind::KeyNotFound,
                        format!("ordinal {} is not a variant of union {}", other, #disc_name_lit),
                    )),
                }
            }

            pub fn to_string(&self) -> &'static str {
                match self {
                    #(#to_string_arms),*
                }
            }

            pub fn from_string(s: &str) -> wireforge_core::Result<Self> {
                match wireforge_core::hash::hash_str(s) {
                    #(#from_string_arms,)*
                    _ => Err(wireforge_core::error::Error::new(
                        wireforge_core::error::ErrorKind::KeyNotFound,
                        format!("{:?} is not a variant of union {}", s, #disc_name_lit),
                    )),
                }
            }
        }
    };

    let discriminator_arms = variant_idents.iter().map(|v| {
        quote! { #container_ident::#v(_) => #disc_ident::#v }
    });

    let binary_encode_arms = variants.iter().zip(&variant_idents).map(|((_, r), v)| {
        let value = resolved::value_ref_expr(r, &quote! { inner });
        let stmt = resolved::binary_encode_stmt(r, &quote! { enc }, &value);
        quote! { #container_ident::#v(inner) => { #stmt Ok(()) } }
    });
    let decode_ordinal_arms = variants.iter().zip(&variant_idents).map(|((_, r), v)| {
        let expr = resolved::binary_decode_expr(schema, r, &quote! { dec });
        quote! { ord if ord == #disc_ident::#v.ordinal() => Ok(#container_ident::#v(#expr)) }
    });

    let text_encode_arms = variants.iter().zip(&variant_idents).map(|((_, r), v)| {
        let value = resolved::value_ref_expr(r, &quote! { inner });
        let stmt = resolved::text_encode_stmt(&quote! { enc }, r, &value);
        quote! { #container_ident::#v(inner) => { #stmt Ok(()) } }
    });
    let decode_tagged_text_arms = variants.iter().zip(&variant_idents).map(|((tag, r), v)| {
        let expr = resolved::text_decode_expr(schema, r, &quote! { dec });
        quote! { #tag => Ok(#container_ident::#v(#expr)) }
    });

    let container_decl = quote! {
        #[derive(Debug, Clone, PartialEq)]
        pub enum #container_ident {
            #(#variant_idents(#payload_types)),*
        }

        impl #container_ident {
            pub fn discriminator(&self) -> #disc_ident {
                match self {
                    #(#discriminator_arms),*
                }
            }

            pub fn encode_binary<W: wireforge_core::cursor::OutputCursor>(
                &self,
                enc: &mut wireforge_core::binary::BinaryEncoder<W>,
            ) -> wireforge_core::Result<()> {
                match self {
                    #(#binary_encode_arms),*
                }
            }

            pub fn decode_ordinal(ordinal: u32, dec: &mut wireforge_core::binary::BinaryDecoder) -> wireforge_core::Result<Self> {
                match ordinal {
                    #(#decode_ordinal_arms,)*
                    other => Err(wireforge_core::error::Error::new(
                        wireforge_core::error::ErrorKind::KeyNotFound,
                        format!("ordinal {} is not a variant of union {}", other, #disc_name_lit),
                    )),
                }
            }

            pub fn decode_tagged(tag: &str, dec: &mut wireforge_core::binary::BinaryDecoder) -> wireforge_core::Result<Self> {
                Self::decode_ordinal(#disc_ident::from_string(tag)?.ordinal(), dec)
            }

            pub fn encode_text<W: wireforge_core::cursor::OutputCursor>(
                &self,
                enc: &mut wireforge_core::text::TextEncoder<W>,
            ) -> wireforge_core::Result<()> {
                match self {
                    #(#text_encode_arms),*
                }
            }

            pub fn decode_tagged_text(tag: &str, dec: &mut wireforge_core::text::TextDecoder) -> wireforge_core::Result<Self> {
                match tag {
                    #(#decode_tagged_text_arms,)*
                    other => Err(wireforge_core::error::Error::new(
                        wireforge_core::error::ErrorKind::KeyNotFound,
                        format!("{:?} is not a variant of union {}", other, #disc_name_lit),
                    )),
                }
            }
        }
    };

    Ok(quote! {
        #discriminator_decl
        #container_decl
    })
}
