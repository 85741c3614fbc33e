//! Record derive macro implementation

use crate::common::attrs::{FieldKind, named_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = named_fields(&input, "Record")?;

    let nodes: Vec<_> = fields
        .iter()
        .filter_map(|field| {
            let ty = &field.ty;
            let column = &field.column;
            match field.kind {
                FieldKind::Column => Some(quote! {
                    sqlbind::record::Field::column(#column)
                }),
                FieldKind::Flatten => Some(quote! {
                    sqlbind::record::Field::embedded(#column, <#ty as sqlbind::Record>::fields())
                }),
                FieldKind::Inline => Some(quote! {
                    sqlbind::record::Field::Inline(<#ty as sqlbind::Record>::fields())
                }),
                FieldKind::Skip => None,
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics sqlbind::Record for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<sqlbind::record::Field> {
                ::std::vec![#(#nodes),*]
            }
        }
    })
}
