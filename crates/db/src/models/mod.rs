//! Row structs for each table.
//!
//! Each submodule contains a `FromRow` struct matching the table's columns
//! and a `TryFrom` conversion into the corresponding `atelier_core` type.
//! String-backed enums are parsed during conversion; an unknown value
//! surfaces as [`StoreError::Backend`].

use std::str::FromStr;

use atelier_core::error::{CoreError, StoreError};

pub mod consultation;
pub mod event;
pub mod project;
pub mod user;

/// Parse a TEXT column into a core enum.
pub(crate) fn parse_column<T>(value: &str, column: &'static str) -> Result<T, StoreError>
where
    T: FromStr<Err = CoreError>,
{
    value
        .parse()
        .map_err(|e: CoreError| StoreError::Backend(format!("column {column}: {e}")))
}
