//! Compile-time validation for the Model derive macro.
//!
//! Every problem found is reported at once, each pointing at its own span.

use std::collections::HashSet;

use proc_macro2::Span;
use syn::{Error, GenericArgument, PathArguments, Type};

use crate::infer::{infer_field_type, parse_field_type_attr, unwrap_option_type};
use crate::parse::{FieldDef, ModelDef};

/// Validate a parsed model definition.
pub fn validate_model(model: &ModelDef) -> Result<(), Error> {
    let mut errors = Vec::new();

    validate_no_generics(model, &mut errors);
    validate_identifier("table name", &model.table_name, model.table_span, &mut errors);
    validate_no_duplicate_keys(model, &mut errors);
    validate_single_primary_key(model, &mut errors);

    for field in &model.fields {
        validate_field(field, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let mut combined = errors.remove(0);
        for err in errors {
            combined.combine(err);
        }
        Err(combined)
    }
}

/// The `FieldType` variant a field is declared with.
///
/// An explicit `field_type` wins over inference from the Rust type.
pub fn resolve_field_type(field: &FieldDef) -> Option<&'static str> {
    match &field.field_type {
        Some((name, _)) => parse_field_type_attr(name),
        None => infer_field_type(&field.ty),
    }
}

fn validate_no_generics(model: &ModelDef, errors: &mut Vec<Error>) {
    if !model.generics.params.is_empty() {
        errors.push(Error::new_spanned(
            &model.generics,
            "Model cannot be derived for generic structs; a model has exactly one definition",
        ));
    }
}

fn validate_identifier(what: &str, name: &str, span: Span, errors: &mut Vec<Error>) {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        errors.push(Error::new(
            span,
            format!(
                "{what} '{name}' must start with a letter or underscore and contain only \
                 ASCII letters, digits and underscores"
            ),
        ));
    }
}

/// Validate that no two fields read the same mapping key.
fn validate_no_duplicate_keys(model: &ModelDef, errors: &mut Vec<Error>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for field in &model.fields {
        if !seen.insert(&field.key) {
            errors.push(Error::new(
                field.name.span(),
                format!(
                    "duplicate field name '{}'; another field already reads this key",
                    field.key
                ),
            ));
        }
    }
}

fn validate_single_primary_key(model: &ModelDef, errors: &mut Vec<Error>) {
    for field in model.fields.iter().filter(|f| f.primary_key).skip(1) {
        errors.push(Error::new(
            field.name.span(),
            "only one field can be marked #[targa(primary_key)]",
        ));
    }
}

fn validate_field(field: &FieldDef, errors: &mut Vec<Error>) {
    validate_identifier("field name", &field.key, field.name.span(), errors);

    if is_nested_option(&field.ty) {
        errors.push(Error::new(
            field.name.span(),
            "nested Option<Option<T>> is ambiguous and not supported; use a single Option<T>",
        ));
    }

    if matches!(unwrap_option_type(&field.ty), Type::Reference(_) | Type::Ptr(_)) {
        errors.push(Error::new(
            field.name.span(),
            "reference and pointer types are not supported; use owned types instead",
        ));
    }

    match &field.field_type {
        Some((name, span)) if parse_field_type_attr(name).is_none() => {
            errors.push(Error::new(
                *span,
                format!(
                    "unknown field_type '{name}' (supported: integer, float, decimal, text, \
                     boolean, bytes, json)"
                ),
            ));
        }
        None if infer_field_type(&field.ty).is_none() => {
            errors.push(Error::new(
                field.name.span(),
                "cannot infer a field type for this Rust type; \
                 add #[targa(field_type = \"...\")]",
            ));
        }
        _ => {}
    }
}

fn is_nested_option(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    let Some(segment) = type_path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Option" {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };
    matches!(
        args.args.first(),
        Some(GenericArgument::Type(Type::Path(inner)))
            if inner.path.segments.last().is_some_and(|s| s.ident == "Option")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_model;
    use syn::{DeriveInput, parse_quote};

    fn check(input: DeriveInput) -> Result<(), Error> {
        validate_model(&parse_model(&input).unwrap())
    }

    #[test]
    fn test_valid_model() {
        assert!(
            check(parse_quote! {
                struct Team {
                    #[targa(primary_key)]
                    id: i64,
                    name: String,
                    logo: Option<Vec<u8>>,
                    #[targa(field_type = "decimal")]
                    budget: String,
                }
            })
            .is_ok()
        );
    }

    #[test]
    fn test_duplicate_key() {
        let err = check(parse_quote! {
            struct Team {
                name: String,
                #[targa(column = "name")]
                display_name: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("duplicate field name"));
    }

    #[test]
    fn test_generic_rejected() {
        assert!(
            check(parse_quote! {
                struct Wrapper<T> { value: T }
            })
            .is_err()
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = check(parse_quote! {
            struct Event { at: chrono::NaiveDateTime }
        })
        .unwrap_err();
        assert!(err.to_string().contains("cannot infer"));
    }

    #[test]
    fn test_bad_field_type_rejected() {
        let err = check(parse_quote! {
            struct Event {
                #[targa(field_type = "uuid")]
                id: String,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("unknown field_type"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(
            check(parse_quote! {
                #[targa(table = "team-list")]
                struct Team { id: i64 }
            })
            .is_err()
        );
        assert!(
            check(parse_quote! {
                struct Team {
                    #[targa(column = "team id")]
                    id: i64,
                }
            })
            .is_err()
        );
    }

    #[test]
    fn test_nested_option_and_references_rejected() {
        assert!(
            check(parse_quote! {
                struct Team { rating: Option<Option<f64>> }
            })
            .is_err()
        );
        assert!(
            check(parse_quote! {
                struct Team { name: &'static str }
            })
            .is_err()
        );
    }

    #[test]
    fn test_two_primary_keys_rejected() {
        assert!(
            check(parse_quote! {
                struct Team {
                    #[targa(primary_key)]
                    id: i64,
                    #[targa(primary_key)]
                    code: String,
                }
            })
            .is_err()
        );
    }

    #[test]
    fn test_resolve_field_type_prefers_override() {
        let model = parse_model(&parse_quote! {
            struct Price {
                #[targa(field_type = "json")]
                raw: String,
                plain: String,
            }
        })
        .unwrap();
        assert_eq!(resolve_field_type(&model.fields[0]), Some("Json"));
        assert_eq!(resolve_field_type(&model.fields[1]), Some("Text"));
    }
}
