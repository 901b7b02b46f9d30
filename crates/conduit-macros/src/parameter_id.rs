//! Derive macro for the `ParameterId` trait.
//!
//! ```ignore
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ParameterId)]
//! pub enum Id {
//!     Threshold,   // ordinal 0
//!     Ratio,       // ordinal 1
//!     Output = 10, // ordinal 10
//!     Mix,         // ordinal 11
//! }
//! ```
//!
//! Ordinals are the enum's discriminants, so the store key of a variant
//! (`"param_<ordinal>"`) only changes if its discriminant does.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

/// Generate the `ParameterId` implementation for a fieldless enum.
pub fn derive_parameter_id_impl(input: DeriveInput) -> syn::Result<TokenStream> {
    let data_enum = match &input.data {
        Data::Enum(e) => e,
        Data::Struct(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(ParameterId)] only supports enums, not structs",
            ))
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(ParameterId)] only supports enums, not unions",
            ))
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(ParameterId)] does not support generic enums",
        ));
    }

    if data_enum.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "#[derive(ParameterId)] requires at least one variant",
        ));
    }

    for variant in &data_enum.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "#[derive(ParameterId)] only supports unit variants (no fields)",
            ));
        }
    }

    let enum_name = &input.ident;

    // Guards instead of literal patterns so explicit discriminant
    // expressions work unchanged
    let from_ordinal_arms: Vec<TokenStream> = data_enum
        .variants
        .iter()
        .map(|v| {
            let ident = &v.ident;
            quote! {
                x if x == #enum_name::#ident as u32 => ::core::option::Option::Some(#enum_name::#ident),
            }
        })
        .collect();

    Ok(quote! {
        impl ::conduit::core::ParameterId for #enum_name {
            #[inline]
            fn ordinal(self) -> u32 {
                self as u32
            }

            fn from_ordinal(ordinal: u32) -> ::core::option::Option<Self> {
                match ordinal {
                    #(#from_ordinal_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}
