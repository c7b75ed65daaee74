//! Procedural macros for Targa.
//!
//! `#[derive(Model)]` reads a struct's field list at compile time and
//! generates the `targa_core::Model` implementation: the model and table
//! names, the configuration, a static descriptor per field, and the
//! conversion from a validated instance into the struct.
//!
//! Generated code refers to `targa_core` by path, so crates using the derive
//! depend on `targa-core` alongside `targa`.

use proc_macro::TokenStream;
use quote::quote;

mod infer;
mod parse;
mod validate;

use parse::{ExtraAttr, ModelDef, parse_model};

/// Derive macro for the `Model` trait.
///
/// # Attributes
///
/// - `#[targa(table = "name")]` - Override the table name (defaults to the
///   snake_case struct name with an `s` appended)
/// - `#[targa(extra = "forbid" | "ignore")]` - Policy for undeclared keys (default `forbid`)
/// - `#[targa(strict)]` - Reject values that would need coercion
/// - `#[targa(primary_key)]` - Mark the primary-key field
/// - `#[targa(column = "name")]` - Read this field from a differently named key
/// - `#[targa(field_type = "decimal")]` - Declare the field type explicitly
///
/// `Option<T>` fields accept NULL.
///
/// # Example
///
/// ```ignore
/// use targa::Model;
///
/// #[derive(Model)]
/// struct EventTeam {
///     #[targa(primary_key)]
///     id: i64,
///     event_key: String,
///     #[targa(column = "teamNumber")]
///     team_number: i32,
///     rank: Option<i32>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(targa))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    let model = match parse_model(&input) {
        Ok(m) => m,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Err(e) = validate::validate_model(&model) {
        return e.to_compile_error().into();
    }

    generate_model_impl(&model).into()
}

/// Generate the Model trait implementation from a validated model definition.
fn generate_model_impl(model: &ModelDef) -> proc_macro2::TokenStream {
    let name = &model.name;
    let model_name = name.to_string();
    let table_name = &model.table_name;
    let strict = model.strict;
    let extra = match model.extra {
        ExtraAttr::Forbid => quote! { targa_core::ExtraFields::Forbid },
        ExtraAttr::Ignore => quote! { targa_core::ExtraFields::Ignore },
    };

    let descriptors = model.fields.iter().map(|field| {
        let key = &field.key;
        // validate_model has already rejected unresolvable types.
        let field_type = infer::field_type_tokens(validate::resolve_field_type(field).unwrap_or("Text"));
        let nullable = field.nullable;
        let primary_key = field.primary_key;
        quote! {
            targa_core::FieldDescriptor::new(#key, #field_type)
                .nullable(#nullable)
                .primary_key(#primary_key)
        }
    });

    let assignments = model.fields.iter().map(|field| {
        let ident = &field.name;
        let key = &field.key;
        let ty = &field.ty;
        quote! {
            #ident: instance.get_as::<#ty>(#key)?
        }
    });

    quote! {
        impl targa_core::Model for #name {
            const MODEL_NAME: &'static str = #model_name;
            const TABLE_NAME: &'static str = #table_name;

            fn fields() -> &'static [targa_core::FieldDescriptor] {
                static FIELDS: &[targa_core::FieldDescriptor] = &[
                    #(#descriptors),*
                ];
                FIELDS
            }

            fn config() -> targa_core::ModelConfig {
                targa_core::ModelConfig::new()
                    .extra(#extra)
                    .strict(#strict)
            }

            #[allow(clippy::result_large_err, unused_variables)]
            fn from_instance(
                instance: &targa_core::ModelInstance<'_>,
            ) -> targa_core::Result<Self> {
                Ok(Self {
                    #(#assignments),*
                })
            }
        }
    }
}
