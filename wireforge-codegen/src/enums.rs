//! Generates the Rust type for a schema [`Enum`]: a C-like enum plus a
//! round-trip `to_string`/`from_string` pair (dispatched via the shared
//! string hash) and an `ordinal`/`from_ordinal` pair (for the binary
//! codec, which encodes enums as a VLQ-wrapped ordinal, not a name).

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use tracing::debug;
use wireforge_core::error::{ensure, Result};
use wireforge_core::hash::hash_str;
use wireforge_idl::ast::{Enum, EnumId, Schema};

use crate::naming;

pub fn generate_enum(schema: &Schema, enum_id: EnumId) -> Result<TokenStream> {
    let en: &Enum = &schema.enums[enum_id as usize];
    debug!(enum_name = %en.name, symbols = en.symbols.len(), "emitting enum");
    check_no_symbol_collisions(en)?;

    let enum_ident = naming::type_ident(&en.name);
    let variant_idents: Vec<_> = en.symbols.iter().map(|s| naming::type_ident(s)).collect();

    let ordinal_arms = variant_idents.iter().enumerate().map(|(i, v)| {
        let i = i as u32;
        quote! { #enum_ident::#v => #i }
    });
    let from_ordinal_arms = variant_idents.iter().enumerate().map(|(i, v)| {
        let i = i as u32;
        quote! { #i => Ok(#enum_ident::#v) }
    });
    let to_string_arms = en.symbols.iter().zip(&variant_idents).map(|(sym, v)| {
        quote! { #enum_ident::#v => #sym }
    });
    let from_string_arms = en.symbols.iter().zip(&variant_idents).map(|(sym, v)| {
        let h = hash_str(sym);
        quote! { #h => Ok(#enum_ident::#v) }
    });

    let enum_name_lit = &en.name;

    Ok(quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum #enum_ident {
            #(#variant_idents),*
        }

        impl #enum_ident {
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
                        format!("ordinal {} is not a symbol of enum {}", other, #enum_name_lit),
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
                        format!("{:?} is not a symbol of enum {}", s, #enum_name_lit),
                    )),
                }
            }
        }
    })
}

/// The code generator must statically verify that no two symbols within
/// an enum collide under the shared (non-cryptographic) hash before
/// emitting hash-dispatched `from_string`.
fn check_no_symbol_collisions(en: &Enum) -> Result<()> {
    let mut seen: HashMap<u64, &str> = HashMap::new();
    for symbol in &en.symbols {
        let h = hash_str(symbol);
        if let Some(prev) = seen.insert(h, symbol) {
            ensure!(
                prev == symbol.as_str(),
                BadClassMember,
                "symbols {:?} and {:?} of enum {:?} collide under the dispatch hash",
                prev,
                symbol,
                en.name
            );
        }
    }
    Ok(())
}
