//! FromRow derive macro implementation

use crate::common::attrs::{FieldKind, named_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = named_fields(&input, "FromRow")?;

    let field_extracts: Vec<_> = fields
        .iter()
        .map(|field| {
            let field_name = &field.ident;
            let ty = &field.ty;
            let column = &field.column;

            match field.kind {
                FieldKind::Column => quote! {
                    #field_name: row.try_get_column(&row.scoped_name(prefix, #column))?
                },
                FieldKind::Flatten => quote! {
                    #field_name: <#ty as sqlbind::FromRow>::from_scope(
                        row,
                        &row.scoped_name(prefix, #column),
                    )?
                },
                FieldKind::Inline => quote! {
                    #field_name: <#ty as sqlbind::FromRow>::from_scope(row, prefix)?
                },
                FieldKind::Skip => quote! {
                    #field_name: ::core::default::Default::default()
                },
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics sqlbind::FromRow for #name #ty_generics #where_clause {
            fn from_scope(row: &sqlbind::Row, prefix: &str) -> sqlbind::SqlResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
