//! SQL text helpers shared by the filter builder and the pivot synthesizer.
//!
//! - [`quote`] - identifier and literal quoting
//! - [`types`] - engine type strings to semantic type classes

pub mod quote;
pub mod types;

pub use quote::{is_bare_identifier, literal_text, quote_identifier, quote_literal};
pub use types::{normalize_type, TypeClass};
