//! Derive macros for the Conduit parameter framework.
//!
//! This crate provides `#[derive(ParameterId)]`, which turns a fieldless
//! enum into a parameter ID usable with `ParameterSet`, `ParameterManager`
//! and friends.
//!
//! # Example
//!
//! ```ignore
//! use conduit::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ParameterId)]
//! pub enum Id {
//!     Gain,
//!     Mix,
//! }
//! ```
//!
//! The generated code refers to `::conduit::core`, so depend on the
//! `conduit` facade crate rather than on this crate directly.

use proc_macro::TokenStream;

mod parameter_id;

/// Derive macro for the `ParameterId` trait.
///
/// Requirements:
/// - Only fieldless enums, without generics
/// - The enum must also derive `Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug`
///   (supertraits of `ParameterId`)
///
/// Each variant's ordinal is its discriminant (`Variant as u32`), explicit
/// discriminants included.
#[proc_macro_derive(ParameterId)]
pub fn derive_parameter_id(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    match parameter_id::derive_parameter_id_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
