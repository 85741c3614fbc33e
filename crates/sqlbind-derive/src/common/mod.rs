//! Helpers shared by the derive macros.

pub(crate) mod attrs;
