//! Field type inference from Rust types.

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{GenericArgument, PathArguments, Type};

/// Infer the declared field type from a Rust type.
///
/// Returns the `FieldType` variant name, or `None` when the type has no
/// natural mapping and needs `#[targa(field_type = "...")]`.
pub fn infer_field_type(ty: &Type) -> Option<&'static str> {
    let inner_ty = unwrap_option_type(ty);
    let type_str = type_to_string(inner_ty);

    let variant = match type_str.as_str() {
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" => "Integer",
        "f32" | "f64" => "Float",
        "bool" => "Boolean",
        "String" | "std::string::String" => "Text",
        "Vec<u8>" | "std::vec::Vec<u8>" => "Bytes",
        "serde_json::Value" => "Json",
        _ => return None,
    };
    Some(variant)
}

/// Map a `field_type = "..."` attribute to a `FieldType` variant name.
///
/// Mirrors `FieldType::parse` in targa-core.
pub fn parse_field_type_attr(name: &str) -> Option<&'static str> {
    let variant = match name.to_ascii_lowercase().as_str() {
        "integer" | "int" | "bigint" | "smallint" | "tinyint" => "Integer",
        "float" | "double" | "real" => "Float",
        "decimal" | "numeric" => "Decimal",
        "text" | "string" | "varchar" | "char" => "Text",
        "boolean" | "bool" => "Boolean",
        "bytes" | "blob" | "binary" | "varbinary" => "Bytes",
        "json" => "Json",
        _ => return None,
    };
    Some(variant)
}

/// Tokens constructing `targa_core::FieldType::<variant>`.
pub fn field_type_tokens(variant: &str) -> TokenStream {
    let ident = syn::Ident::new(variant, proc_macro2::Span::call_site());
    quote! { targa_core::FieldType::#ident }
}

/// Check whether the outermost type is `Option<_>`.
pub fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

/// Unwrap Option<T> to get the inner type, or return the original type.
pub fn unwrap_option_type(ty: &Type) -> &Type {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner)) = args.args.first() {
                        return inner;
                    }
                }
            }
        }
    }
    ty
}

/// Convert a Type to a simplified string representation for matching.
fn type_to_string(ty: &Type) -> String {
    ty.to_token_stream().to_string().replace(' ', "")
}
