//! Derive macros for sqlbind
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Record)]` macros.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod from_row;
mod record;

/// Derive `FromRow` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use sqlbind::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     #[orm(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(rename_all = "snake_case")]` - Struct-level column naming rule
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(skip)]` - Leave the field unmapped and use `Default::default()`
/// - `#[orm(flatten)]` - Read an embedded record from `field_*` columns
/// - `#[orm(flatten, inline)]` - Read an embedded record from unprefixed columns
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Record` column metadata for a struct.
///
/// Accepts the same `#[orm(...)]` attributes as `FromRow`, so a type deriving
/// both selects exactly the columns it reads.
///
/// ```ignore
/// use sqlbind::{Record, FromRow};
///
/// #[derive(Record, FromRow)]
/// struct Order {
///     id: i64,
///     #[orm(flatten)]
///     customer: Customer, // customer_id, customer_name
/// }
/// ```
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
