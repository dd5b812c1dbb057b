//! Derive macros for todosync
//!
//! Actions in todosync are a single enum mixing user intents (things the
//! user asked for) and outcomes (what a remote call reported back). The
//! `Action` derive generates the classification helpers the reducer and the
//! log lines rely on.
//!
//! # Example
//!
//! ```ignore
//! use todosync_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum AppAction {
//!     #[intent]
//!     SetFilter { filter: Filter },
//!
//!     #[mutation]
//!     AddTodo { title: String },
//!
//!     #[outcome]
//!     TodoAdded { todo: Todo },
//! }
//!
//! assert!(AppAction::AddTodo { title: "x".into() }.is_intent());
//! assert!(AppAction::AddTodo { title: "x".into() }.is_mutation());
//! assert_eq!(AppAction::SetFilter { filter: Filter::All }.name(), "SetFilter");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident};

/// Derive macro for action enums
///
/// Generates:
/// - `is_intent()` - true for `#[intent]` and `#[mutation]` variants
/// - `is_mutation()` - true for `#[mutation]` variants (intents that write remotely)
/// - `is_outcome()` - true for `#[outcome]` variants
/// - `name()` - the variant name, for log fields
///
/// # Attributes
///
/// - `#[intent]` - A user request that does not write to the backend
/// - `#[mutation]` - A user request that writes to the backend
/// - `#[outcome]` - A result fed back by an effect
///
/// Unmarked variants are neither intents nor outcomes.
///
/// # Errors
///
/// Produces a compile error if:
/// - Applied to a non-enum type
/// - A variant carries more than one classification attribute
#[proc_macro_derive(Action, attributes(intent, mutation, outcome))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut intent_arms = Vec::new();
    let mut mutation_arms = Vec::new();
    let mut outcome_arms = Vec::new();
    let mut name_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_intent = has_attribute(&variant.attrs, "intent");
        let is_mutation = has_attribute(&variant.attrs, "mutation");
        let is_outcome = has_attribute(&variant.attrs, "outcome");

        let marks = [is_intent, is_mutation, is_outcome]
            .iter()
            .filter(|marked| **marked)
            .count();
        if marks > 1 {
            return syn::Error::new_spanned(
                variant,
                "Variant can carry only one of #[intent], #[mutation] or #[outcome]",
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(&variant.ident, &variant.fields);

        if is_intent || is_mutation {
            intent_arms.push(quote! { #pattern => true, });
        }
        if is_mutation {
            mutation_arms.push(quote! { #pattern => true, });
        }
        if is_outcome {
            outcome_arms.push(quote! { #pattern => true, });
        }

        let label = variant.ident.to_string();
        name_arms.push(quote! { #pattern => #label, });
    }

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a user intent
            #[must_use]
            pub const fn is_intent(&self) -> bool {
                match self {
                    #(#intent_arms)*
                    _ => false,
                }
            }

            /// Returns true if this intent writes to the backend
            #[must_use]
            pub const fn is_mutation(&self) -> bool {
                match self {
                    #(#mutation_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action reports the result of a remote call
            #[must_use]
            pub const fn is_outcome(&self) -> bool {
                match self {
                    #(#outcome_arms)*
                    _ => false,
                }
            }

            /// Returns the variant name
            #[must_use]
            pub const fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Builds a wildcard match pattern for a variant
fn variant_pattern(ident: &Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
