//! `#[orm(...)]` attribute parsing shared by the `FromRow` and `Record` derives.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use syn::{Data, DeriveInput, Fields, Result};

/// Struct-level column naming rule.
#[derive(Clone, Copy)]
pub(crate) enum RenameRule {
    Snake,
    Camel,
    Pascal,
    ScreamingSnake,
    Lower,
    Upper,
}

impl RenameRule {
    fn parse(lit: &syn::LitStr) -> Result<Self> {
        Ok(match lit.value().as_str() {
            "snake_case" => RenameRule::Snake,
            "camelCase" => RenameRule::Camel,
            "PascalCase" => RenameRule::Pascal,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            other => {
                return Err(syn::Error::new_spanned(
                    lit,
                    format!("unknown rename_all rule `{other}`"),
                ));
            }
        })
    }

    fn apply(self, name: &str) -> String {
        match self {
            RenameRule::Snake => name.to_snake_case(),
            RenameRule::Camel => name.to_lower_camel_case(),
            RenameRule::Pascal => name.to_upper_camel_case(),
            RenameRule::ScreamingSnake => name.to_shouty_snake_case(),
            RenameRule::Lower => name.to_lowercase(),
            RenameRule::Upper => name.to_uppercase(),
        }
    }
}

/// How a field maps onto result columns.
pub(crate) enum FieldKind {
    /// One column.
    Column,
    /// An embedded record under this field's column prefix.
    Flatten,
    /// An embedded record whose columns are unprefixed.
    Inline,
    /// Not mapped; filled with `Default::default()`.
    Skip,
}

pub(crate) struct FieldSpec {
    pub ident: syn::Ident,
    pub ty: syn::Type,
    /// Column name, or the prefix for a flattened record.
    pub column: String,
    pub kind: FieldKind,
}

fn orm_attrs(attrs: &[syn::Attribute]) -> impl Iterator<Item = &syn::Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("orm"))
}

fn struct_rename_rule(input: &DeriveInput) -> Result<Option<RenameRule>> {
    let mut rule = None;
    for attr in orm_attrs(&input.attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                rule = Some(RenameRule::parse(&lit)?);
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute, expected `rename_all`"))
            }
        })?;
    }
    Ok(rule)
}

fn field_spec(field: &syn::Field, rule: Option<RenameRule>) -> Result<FieldSpec> {
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };

    let mut column = None;
    let mut skip = false;
    let mut flatten = false;
    let mut inline = false;

    for attr in orm_attrs(&field.attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                column = Some(lit.value());
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("flatten") {
                flatten = true;
            } else if meta.path.is_ident("inline") {
                inline = true;
            } else {
                return Err(meta.error(
                    "unsupported field attribute, expected `column`, `skip`, `flatten` or `inline`",
                ));
            }
            Ok(())
        })?;
    }

    if skip && (flatten || inline || column.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "`skip` cannot be combined with other orm attributes",
        ));
    }
    if inline && !flatten {
        return Err(syn::Error::new_spanned(field, "`inline` requires `flatten`"));
    }

    let kind = match (skip, flatten, inline) {
        (true, _, _) => FieldKind::Skip,
        (_, true, true) => FieldKind::Inline,
        (_, true, false) => FieldKind::Flatten,
        _ => FieldKind::Column,
    };

    let column = column.unwrap_or_else(|| {
        let name = ident.to_string();
        let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
        match rule {
            Some(rule) => rule.apply(&name),
            None => name,
        }
    });

    Ok(FieldSpec {
        ident,
        ty: field.ty.clone(),
        column,
        kind,
    })
}

/// Parse every field of a struct with named fields.
pub(crate) fn named_fields(input: &DeriveInput, derive: &str) -> Result<Vec<FieldSpec>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    let rule = struct_rename_rule(input)?;
    fields.iter().map(|field| field_spec(field, rule)).collect()
}
