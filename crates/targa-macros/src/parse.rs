//! Parsing logic for the Model derive macro.
//!
//! Extracts struct-level and field-level `#[targa(...)]` attributes into
//! `ModelDef` and `FieldDef`, which the validator and code generator consume.

use proc_macro2::Span;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Generics, Ident, Lit, Result, Type};

use crate::infer::is_option_type;

/// Policy for undeclared keys, as written in `#[targa(extra = "...")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtraAttr {
    #[default]
    Forbid,
    Ignore,
}

/// Parsed model definition from a struct with `#[derive(Model)]`.
#[derive(Debug)]
pub struct ModelDef {
    /// The struct name (e.g., `EventTeam`).
    pub name: Ident,
    /// The table name (e.g., `"event_teams"`).
    pub table_name: String,
    /// Span of an explicit `table = "..."`, for error reporting.
    pub table_span: Span,
    pub fields: Vec<FieldDef>,
    pub generics: Generics,
    pub extra: ExtraAttr,
    pub strict: bool,
}

/// Parsed field definition from a struct field.
#[derive(Debug)]
pub struct FieldDef {
    /// The Rust field name.
    pub name: Ident,
    /// Key looked up in a row mapping; the field name unless `column` is set.
    pub key: String,
    pub ty: Type,
    /// Explicit `field_type = "..."` with its span.
    pub field_type: Option<(String, Span)>,
    /// Whether the field is an `Option<T>`.
    pub nullable: bool,
    pub primary_key: bool,
}

/// Parse a `DeriveInput` into a `ModelDef`.
pub fn parse_model(input: &DeriveInput) -> Result<ModelDef> {
    let name = input.ident.clone();

    let StructAttrs {
        table,
        extra,
        strict,
    } = parse_struct_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not unions",
            ));
        }
    };

    let (table_name, table_span) = match table {
        Some((table_name, span)) => (table_name, span),
        None => (derive_table_name(&name.to_string()), name.span()),
    };

    Ok(ModelDef {
        name,
        table_name,
        table_span,
        fields,
        generics: input.generics.clone(),
        extra,
        strict,
    })
}

#[derive(Default)]
struct StructAttrs {
    table: Option<(String, Span)>,
    extra: ExtraAttr,
    strict: bool,
}

/// Parse struct-level `#[targa(...)]` attributes.
///
/// Supported keys: `table = "name"`, `extra = "forbid" | "ignore"`, `strict`.
fn parse_struct_attrs(attrs: &[Attribute]) -> Result<StructAttrs> {
    let mut result = StructAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("targa") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                if result.table.is_some() {
                    return Err(Error::new_spanned(
                        meta.path,
                        "duplicate targa attribute: table",
                    ));
                }
                let lit_str = string_value(&meta, "table")?;
                result.table = Some((lit_str.value(), lit_str.span()));
                Ok(())
            } else if meta.path.is_ident("extra") {
                let lit_str = string_value(&meta, "extra")?;
                result.extra = match lit_str.value().to_lowercase().as_str() {
                    "forbid" => ExtraAttr::Forbid,
                    "ignore" => ExtraAttr::Ignore,
                    _ => {
                        return Err(Error::new_spanned(
                            lit_str,
                            "extra must be one of: 'forbid', 'ignore'",
                        ));
                    }
                };
                Ok(())
            } else if meta.path.is_ident("strict") {
                result.strict = true;
                Ok(())
            } else {
                Err(Error::new_spanned(
                    meta.path,
                    "unknown targa struct attribute (supported: table, extra, strict)",
                ))
            }
        })?;
    }

    Ok(result)
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>, key: &str) -> Result<syn::LitStr> {
    let value: Lit = meta.value()?.parse()?;
    match value {
        Lit::Str(lit_str) => Ok(lit_str),
        other => Err(Error::new_spanned(
            other,
            format!("expected string literal for {key}"),
        )),
    }
}

/// Derive the table name from the struct name.
///
/// `_` goes before every non-initial uppercase letter, the result is
/// lowercased, and an `s` is appended unless it already ends in `s`.
pub fn derive_table_name(struct_name: &str) -> String {
    let mut table = String::with_capacity(struct_name.len() + 4);
    for (i, c) in struct_name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            table.push('_');
        }
        table.extend(c.to_lowercase());
    }
    if !table.ends_with('s') {
        table.push('s');
    }
    table
}

fn parse_fields(fields: &Fields) -> Result<Vec<FieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_field).collect(),
        Fields::Unnamed(_) => Err(Error::new(
            Span::call_site(),
            "Model requires a struct with named fields, not a tuple struct",
        )),
        Fields::Unit => Ok(Vec::new()),
    }
}

fn parse_field(field: &Field) -> Result<FieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut key = None;
    let mut field_type = None;
    let mut primary_key = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("targa") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                primary_key = true;
                Ok(())
            } else if meta.path.is_ident("column") {
                let lit_str = string_value(&meta, "column")?;
                key = Some(lit_str.value());
                Ok(())
            } else if meta.path.is_ident("field_type") {
                let lit_str = string_value(&meta, "field_type")?;
                field_type = Some((lit_str.value(), lit_str.span()));
                Ok(())
            } else {
                Err(Error::new_spanned(
                    meta.path,
                    "unknown targa field attribute (supported: primary_key, column, field_type)",
                ))
            }
        })?;
    }

    let ident = name.to_string();
    let key = key.unwrap_or_else(|| ident.strip_prefix("r#").unwrap_or(&ident).to_string());

    Ok(FieldDef {
        key,
        nullable: is_option_type(&field.ty),
        ty: field.ty.clone(),
        name,
        field_type,
        primary_key,
    })
}
